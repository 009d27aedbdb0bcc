use std::fmt;

/// Falha de uma tentativa de processamento de arquivo. O chamador decide
/// a pasta terminal inspecionando este resultado.
#[derive(Debug)]
pub enum ProcessError {
    Download(String),
    Caption(String),
    Webhook(String),
    WebhookStatus(u16),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download(msg) => write!(f, "Falha no download da imagem: {msg}"),
            Self::Caption(msg) => write!(f, "Falha na geração de legenda: {msg}"),
            Self::Webhook(msg) => write!(f, "Falha no envio do webhook: {msg}"),
            Self::WebhookStatus(code) => write!(f, "Webhook retornou status {code}"),
        }
    }
}

impl std::error::Error for ProcessError {}
