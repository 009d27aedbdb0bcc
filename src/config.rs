use anyhow::{Context, Result};
use log::{error, warn};
use serde::Deserialize;

/// Destino social de uma pasta monitorada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Linkedin,
    Meta,
    Gbp,
    All,
}

impl SourceType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Meta => "meta",
            Self::Gbp => "gbp",
            Self::All => "all",
        }
    }

    /// Destinos que consomem a imagem por URL em vez de binário inline.
    pub fn needs_staging(self) -> bool {
        matches!(self, Self::Meta | Self::All)
    }
}

/// Fotografia imutável do ambiente, montada uma vez na subida do processo.
///
/// Nenhuma variável é obrigatória aqui: o que faltar é reportado em
/// `log_missing` e a falta só vira erro no ponto de uso (o Drive na
/// subida, o resto por arquivo).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub google_creds_json: Option<String>,
    pub gemini_api_key: Option<String>,
    pub make_webhook_url: Option<String>,

    pub id_linkedin: Option<String>,
    pub id_meta: Option<String>,
    pub id_gbp: Option<String>,
    pub id_all: Option<String>,
    pub id_config: Option<String>,
    pub id_processed: Option<String>,
    pub id_errors: Option<String>,

    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}

/// Conexão S3 completa o suficiente para habilitar o staging.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        envy::from_env().context("Falha ao ler as variáveis de ambiente")
    }

    /// Pastas monitoradas, na ordem fixa de varredura. Pastas sem
    /// identificador configurado ficam de fora.
    pub fn folder_map(&self) -> Vec<(String, SourceType)> {
        let pairs = [
            (&self.id_linkedin, SourceType::Linkedin),
            (&self.id_meta, SourceType::Meta),
            (&self.id_gbp, SourceType::Gbp),
            (&self.id_all, SourceType::All),
        ];
        pairs
            .into_iter()
            .filter_map(|(id, source)| id.clone().map(|id| (id, source)))
            .collect()
    }

    /// Conjunto S3, ou `None` quando faltar bucket ou credenciais —
    /// nesse caso o staging fica desabilitado.
    pub fn s3(&self) -> Option<S3Settings> {
        let bucket = self.s3_bucket.clone()?;
        let access_key = self.s3_access_key.clone()?;
        let secret_key = self.s3_secret_key.clone()?;
        Some(S3Settings {
            bucket,
            region: self
                .s3_region
                .clone()
                .unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: self.s3_endpoint.clone(),
            access_key,
            secret_key,
        })
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.google_creds_json.is_none() {
            missing.push("GOOGLE_CREDS_JSON");
        }
        if self.gemini_api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        if self.make_webhook_url.is_none() {
            missing.push("MAKE_WEBHOOK_URL");
        }
        missing
    }

    /// Relata o que faltou no ambiente. Diagnóstico apenas: a execução
    /// continua e a falta é tratada no ponto de uso.
    pub fn log_missing(&self) {
        for name in self.missing_required() {
            error!("Variável de ambiente ausente: {name}");
        }
        if self.folder_map().is_empty() {
            warn!("Nenhuma pasta de origem configurada (ID_LINKEDIN/ID_META/ID_GBP/ID_ALL)");
        }
        if self.id_processed.is_none() {
            warn!("ID_PROCESSED não definido; arquivos processados não serão movidos");
        }
        if self.id_errors.is_none() {
            warn!("ID_ERRORS não definido; arquivos com erro não serão movidos");
        }
        if self.s3().is_none() {
            warn!("Configuração S3 incompleta; payloads seguirão sem image_url");
        }
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        google_creds_json: None,
        gemini_api_key: None,
        make_webhook_url: None,
        id_linkedin: None,
        id_meta: None,
        id_gbp: None,
        id_all: None,
        id_config: None,
        id_processed: None,
        id_errors: None,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        s3_access_key: None,
        s3_secret_key: None,
        poll_interval_secs: 60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_map_order_and_skip() {
        let mut settings = test_settings();
        settings.id_meta = Some("pasta-meta".to_string());
        settings.id_all = Some("pasta-all".to_string());

        let map = settings.folder_map();
        assert_eq!(
            map,
            vec![
                ("pasta-meta".to_string(), SourceType::Meta),
                ("pasta-all".to_string(), SourceType::All),
            ]
        );
    }

    #[test]
    fn test_folder_map_full_order() {
        let mut settings = test_settings();
        settings.id_linkedin = Some("a".to_string());
        settings.id_meta = Some("b".to_string());
        settings.id_gbp = Some("c".to_string());
        settings.id_all = Some("d".to_string());

        let sources: Vec<SourceType> =
            settings.folder_map().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            sources,
            vec![
                SourceType::Linkedin,
                SourceType::Meta,
                SourceType::Gbp,
                SourceType::All,
            ]
        );
    }

    #[test]
    fn test_s3_requires_bucket_and_credentials() {
        let mut settings = test_settings();
        assert!(settings.s3().is_none());

        settings.s3_bucket = Some("imagens".to_string());
        settings.s3_access_key = Some("ak".to_string());
        assert!(settings.s3().is_none(), "sem secret key não habilita");

        settings.s3_secret_key = Some("sk".to_string());
        let s3 = settings.s3().expect("conjunto completo");
        assert_eq!(s3.bucket, "imagens");
        assert_eq!(s3.region, "us-east-1");
        assert!(s3.endpoint.is_none());
    }

    #[test]
    fn test_missing_required() {
        let mut settings = test_settings();
        assert_eq!(
            settings.missing_required(),
            vec!["GOOGLE_CREDS_JSON", "GEMINI_API_KEY", "MAKE_WEBHOOK_URL"]
        );

        settings.gemini_api_key = Some("chave".to_string());
        assert_eq!(
            settings.missing_required(),
            vec!["GOOGLE_CREDS_JSON", "MAKE_WEBHOOK_URL"]
        );
    }

    #[test]
    fn test_needs_staging() {
        assert!(!SourceType::Linkedin.needs_staging());
        assert!(SourceType::Meta.needs_staging());
        assert!(!SourceType::Gbp.needs_staging());
        assert!(SourceType::All.needs_staging());
    }
}
