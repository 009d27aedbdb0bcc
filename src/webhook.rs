use log::info;
use reqwest::multipart::{Form, Part};

use crate::error::ProcessError;

/// Entrega o payload por arquivo ao fluxo de automação downstream.
pub struct WebhookClient {
    http: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }

    /// Uma única requisição multipart: os campos do payload como texto e
    /// a imagem original como parte de arquivo chamada `file`. Qualquer
    /// status fora de 2xx é falha.
    pub async fn dispatch(
        &self,
        fields: &[(String, String)],
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ProcessError> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| ProcessError::Webhook(format!("content-type inválido: {e}")))?;
        form = form.part("file", part);

        let resp = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProcessError::Webhook(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProcessError::WebhookStatus(status.as_u16()));
        }

        info!("Webhook aceitou {file_name} (status {status})");
        Ok(())
    }
}
