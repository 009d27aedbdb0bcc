use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use tokio::time::sleep;

use crate::config::Settings;
use crate::drive::DriveClient;
use crate::gemini::CaptionGenerator;
use crate::processor::FileProcessor;
use crate::prompts;
use crate::stager::AssetStager;
use crate::webhook::WebhookClient;

/// Laço de varredura: um ciclo percorre todas as pastas configuradas e
/// processa cada imagem encontrada, um arquivo por vez.
pub struct Poller {
    drive: DriveClient,
    gemini: CaptionGenerator,
    stager: Option<AssetStager>,
    webhook: WebhookClient,
    settings: Settings,
}

impl Poller {
    pub fn new(
        drive: DriveClient,
        gemini: CaptionGenerator,
        stager: Option<AssetStager>,
        webhook: WebhookClient,
        settings: Settings,
    ) -> Self {
        Self {
            drive,
            gemini,
            stager,
            webhook,
            settings,
        }
    }

    /// Um ciclo completo. Os prompts são resolvidos uma única vez e
    /// compartilhados por todos os arquivos do ciclo, para que edições
    /// na pasta de configuração valham já no ciclo seguinte.
    pub async fn cycle(&self) -> Result<()> {
        let prompts = prompts::resolve(&self.drive, self.settings.id_config.as_deref()).await;

        let processor = FileProcessor {
            drive: &self.drive,
            gemini: &self.gemini,
            stager: self.stager.as_ref(),
            webhook: &self.webhook,
            settings: &self.settings,
        };

        for (folder_id, source) in self.settings.folder_map() {
            let files = self.drive.list_images(&folder_id).await?;
            if files.is_empty() {
                continue;
            }
            info!("{} imagem(ns) na pasta {}", files.len(), source.label());
            for file in &files {
                processor.handle(file, source, &prompts).await;
            }
        }

        Ok(())
    }

    /// Roda até receber Ctrl-C. Uma falha de ciclo (listagem, credencial
    /// expirada) é registrada e o laço continua após o intervalo — o
    /// serviço só termina por interrupção.
    pub async fn run(&self) {
        let interval = Duration::from_secs(self.settings.poll_interval_secs);

        loop {
            info!("Iniciando ciclo de varredura...");
            match self.cycle().await {
                Ok(()) => info!("Ciclo concluído. Aguardando {}s...", interval.as_secs()),
                Err(e) => error!("Erro inesperado no ciclo: {e:#}"),
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrompido. Encerrando.");
                    break;
                }
            }
        }
    }
}
