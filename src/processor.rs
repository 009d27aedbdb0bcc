use log::{error, info};

use crate::config::{Settings, SourceType};
use crate::drive::{DriveClient, DriveFile};
use crate::error::ProcessError;
use crate::gemini::CaptionGenerator;
use crate::prompts::PromptSet;
use crate::stager::AssetStager;
use crate::webhook::WebhookClient;

/// Campos de formulário do webhook, na ordem de inserção.
pub type Payload = Vec<(String, String)>;

/// Legendas geradas para um arquivo. Só os destinos pedidos pela origem
/// ficam preenchidos.
#[derive(Debug, Default)]
pub struct Captions {
    pub linkedin: Option<String>,
    pub meta: Option<String>,
    pub gbp: Option<String>,
}

/// Monta o payload: um campo de legenda por destino preenchido, o
/// discriminador `target` e a URL da imagem quando o staging rendeu uma.
pub fn build_payload(source: SourceType, captions: &Captions, image_url: Option<&str>) -> Payload {
    let mut payload = Payload::new();
    if let Some(text) = &captions.linkedin {
        payload.push(("caption_linkedin".to_string(), text.clone()));
    }
    if let Some(text) = &captions.meta {
        payload.push(("caption_meta".to_string(), text.clone()));
    }
    if let Some(text) = &captions.gbp {
        payload.push(("caption_gbp".to_string(), text.clone()));
    }
    payload.push(("target".to_string(), source.label().to_string()));
    if let Some(url) = image_url {
        payload.push(("image_url".to_string(), url.to_string()));
    }
    payload
}

/// Pasta terminal para o desfecho da tentativa, quando configurada.
fn terminal_folder<'a>(
    settings: &'a Settings,
    outcome: &Result<(), ProcessError>,
) -> Option<&'a str> {
    match outcome {
        Ok(()) => settings.id_processed.as_deref(),
        Err(_) => settings.id_errors.as_deref(),
    }
}

/// Processa um arquivo descoberto do início ao fim:
/// download → legendas → staging (condicional) → webhook → realocação.
pub struct FileProcessor<'a> {
    pub drive: &'a DriveClient,
    pub gemini: &'a CaptionGenerator,
    pub stager: Option<&'a AssetStager>,
    pub webhook: &'a WebhookClient,
    pub settings: &'a Settings,
}

impl FileProcessor<'_> {
    /// Executa a tentativa e decide a pasta terminal a partir do
    /// resultado. Nunca propaga falhas para o laço da pasta: um arquivo
    /// ruim não interrompe os demais.
    pub async fn handle(&self, file: &DriveFile, source: SourceType, prompts: &PromptSet) {
        info!("Processando {} ({})", file.name, source.label());

        let outcome = self.run(file, source, prompts).await;
        if let Err(e) = &outcome {
            error!("Erro ao processar {}: {e}", file.name);
        }

        if let Some(destination) = terminal_folder(self.settings, &outcome) {
            self.drive.move_file(&file.id, destination).await;
        }
    }

    async fn run(
        &self,
        file: &DriveFile,
        source: SourceType,
        prompts: &PromptSet,
    ) -> Result<(), ProcessError> {
        let image = self
            .drive
            .download(&file.id)
            .await
            .map_err(|e| ProcessError::Download(format!("{e:#}")))?;

        let captions = self
            .generate_captions(&image, &file.mime_type, source, prompts)
            .await?;

        // Staging só para origens baseadas em URL, e só se houver S3.
        // URL nula não é erro: o payload segue sem image_url.
        let image_url = match self.stager {
            Some(stager) if source.needs_staging() => {
                stager.stage(&file.name, image.clone(), &file.mime_type).await
            }
            _ => None,
        };

        let payload = build_payload(source, &captions, image_url.as_deref());
        self.webhook
            .dispatch(&payload, &file.name, &file.mime_type, image)
            .await
    }

    /// Uma chamada de geração por destino pedido; `all` faz as três em
    /// sequência. Qualquer falha aborta o arquivo inteiro — payload
    /// parcial nunca é enviado.
    async fn generate_captions(
        &self,
        image: &[u8],
        mime_type: &str,
        source: SourceType,
        prompts: &PromptSet,
    ) -> Result<Captions, ProcessError> {
        let mut captions = Captions::default();
        match source {
            SourceType::Linkedin => {
                captions.linkedin = Some(self.caption(image, mime_type, &prompts.linkedin.text).await?);
            }
            SourceType::Meta => {
                captions.meta = Some(self.caption(image, mime_type, &prompts.meta.text).await?);
            }
            SourceType::Gbp => {
                captions.gbp = Some(self.caption(image, mime_type, &prompts.gbp.text).await?);
            }
            SourceType::All => {
                captions.linkedin = Some(self.caption(image, mime_type, &prompts.linkedin.text).await?);
                captions.meta = Some(self.caption(image, mime_type, &prompts.meta.text).await?);
                captions.gbp = Some(self.caption(image, mime_type, &prompts.gbp.text).await?);
            }
        }
        Ok(captions)
    }

    async fn caption(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, ProcessError> {
        self.gemini
            .generate(image, mime_type, prompt)
            .await
            .map_err(|e| ProcessError::Caption(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;

    fn names(payload: &Payload) -> Vec<&str> {
        payload.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn field<'a>(payload: &'a Payload, name: &str) -> Option<&'a str> {
        payload
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_payload_single_target() {
        let captions = Captions {
            gbp: Some("Visite nossa loja".to_string()),
            ..Captions::default()
        };
        let payload = build_payload(SourceType::Gbp, &captions, None);

        assert_eq!(names(&payload), vec!["caption_gbp", "target"]);
        assert_eq!(field(&payload, "target"), Some("gbp"));
        assert_eq!(field(&payload, "caption_gbp"), Some("Visite nossa loja"));
        assert!(field(&payload, "image_url").is_none());
    }

    #[test]
    fn test_payload_all_targets_in_order() {
        let captions = Captions {
            linkedin: Some("li".to_string()),
            meta: Some("mt".to_string()),
            gbp: Some("gb".to_string()),
        };
        let payload = build_payload(SourceType::All, &captions, Some("https://s3/x.png"));

        assert_eq!(
            names(&payload),
            vec![
                "caption_linkedin",
                "caption_meta",
                "caption_gbp",
                "target",
                "image_url",
            ]
        );
        assert_eq!(field(&payload, "target"), Some("all"));
        assert_eq!(field(&payload, "image_url"), Some("https://s3/x.png"));
    }

    #[test]
    fn test_payload_meta_with_url() {
        let captions = Captions {
            meta: Some("casual".to_string()),
            ..Captions::default()
        };
        let payload = build_payload(SourceType::Meta, &captions, Some("https://s3/y.jpg"));

        assert_eq!(names(&payload), vec!["caption_meta", "target", "image_url"]);
        assert_eq!(field(&payload, "target"), Some("meta"));
    }

    #[test]
    fn test_terminal_folder_success() {
        let mut settings = test_settings();
        settings.id_processed = Some("proc".to_string());
        settings.id_errors = Some("err".to_string());

        assert_eq!(terminal_folder(&settings, &Ok(())), Some("proc"));
    }

    #[test]
    fn test_terminal_folder_failure() {
        let mut settings = test_settings();
        settings.id_processed = Some("proc".to_string());
        settings.id_errors = Some("err".to_string());

        let outcome = Err(ProcessError::Caption("quota".to_string()));
        assert_eq!(terminal_folder(&settings, &outcome), Some("err"));
    }

    #[test]
    fn test_terminal_folder_unconfigured_is_noop() {
        let settings = test_settings();
        assert_eq!(terminal_folder(&settings, &Ok(())), None);
        let outcome = Err(ProcessError::WebhookStatus(500));
        assert_eq!(terminal_folder(&settings, &outcome), None);
    }
}
