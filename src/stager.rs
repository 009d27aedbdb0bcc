use std::time::Duration;

use anyhow::{Context, Result};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use log::{info, warn};

use crate::config::S3Settings;

/// Validade da URL pré-assinada devolvida ao webhook.
const URL_EXPIRY_SECS: u64 = 3600;

/// Publica imagens num bucket S3 só para obter uma URL temporária de
/// leitura — exigida pelos destinos que não aceitam binário inline.
pub struct AssetStager {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl AssetStager {
    pub fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "captioner-env",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }

    /// Sobe a imagem sob o nome original e devolve uma URL de leitura
    /// com validade de uma hora. Best-effort: qualquer falha vira `None`
    /// e o processamento do arquivo segue sem `image_url`.
    pub async fn stage(&self, key: &str, bytes: Vec<u8>, mime_type: &str) -> Option<String> {
        match self.try_stage(key, bytes, mime_type).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Staging S3 falhou para {key}: {e:#}");
                None
            }
        }
    }

    async fn try_stage(&self, key: &str, bytes: Vec<u8>, mime_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(mime_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .context("Falha no upload para o S3")?;

        let presigning = PresigningConfig::expires_in(Duration::from_secs(URL_EXPIRY_SECS))
            .context("Configuração de pré-assinatura inválida")?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .context("Falha ao gerar a URL pré-assinada")?;

        info!(
            "Imagem {key} publicada no bucket {} (URL válida por {URL_EXPIRY_SECS}s)",
            self.bucket
        );
        Ok(presigned.uri().to_string())
    }
}
