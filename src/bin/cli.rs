use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use captioner_lib::{config, drive, gemini, poller, stager, webhook};

#[derive(Parser)]
#[command(
    name = "captioner",
    about = "Automação de legendas sociais: Drive + Gemini + webhook Make"
)]
struct Cli {
    /// Executa um único ciclo de varredura e encerra
    #[arg(long)]
    once: bool,

    /// Intervalo entre ciclos, em segundos (sobrepõe POLL_INTERVAL_SECS)
    #[arg(long)]
    interval: Option<u64>,

    /// Verifica as variáveis de ambiente e encerra
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 1. Fotografia do ambiente
    let mut settings = config::Settings::load()?;
    if let Some(secs) = cli.interval {
        settings.poll_interval_secs = secs;
    }

    if cli.check {
        return check_environment(&settings);
    }

    settings.log_missing();
    info!("Iniciando o motor de legendas...");

    // 2. Drive é obrigatório: sem ele não há o que varrer
    let creds = settings
        .google_creds_json
        .clone()
        .context("GOOGLE_CREDS_JSON ausente; impossível conectar ao Drive")?;
    let http = captioner_lib::http_client()?;
    let drive = drive::DriveClient::connect(&creds, http.clone())
        .await
        .context("Não foi possível inicializar o cliente do Drive")?;

    // 3. Gemini e webhook seguem mesmo sem chave/URL: a falta já foi
    // registrada e vira falha por arquivo, roteada para a pasta de erros
    let gemini = gemini::CaptionGenerator::new(
        http.clone(),
        settings.gemini_api_key.clone().unwrap_or_default(),
    );
    let webhook = webhook::WebhookClient::new(
        http,
        settings.make_webhook_url.clone().unwrap_or_default(),
    );

    // 4. Staging é opcional: sem S3 os destinos meta/all seguem sem image_url
    let stager = match settings.s3() {
        Some(s3) => Some(stager::AssetStager::connect(&s3)),
        None => {
            warn!("Staging desabilitado nesta execução.");
            None
        }
    };

    let poller = poller::Poller::new(drive, gemini, stager, webhook, settings);

    if cli.once {
        return poller.cycle().await;
    }

    poller.run().await;
    Ok(())
}

fn check_environment(settings: &config::Settings) -> Result<()> {
    let missing = settings.missing_required();

    for (folder_id, source) in settings.folder_map() {
        println!("Pasta {}: {folder_id}", source.label());
    }
    match settings.s3() {
        Some(s3) => println!("Staging S3: bucket {}", s3.bucket),
        None => println!("Staging S3: desabilitado"),
    }

    if missing.is_empty() {
        println!("Ambiente completo.");
        Ok(())
    } else {
        for name in &missing {
            eprintln!("ERRO: variável ausente: {name}");
        }
        bail!("Variáveis obrigatórias ausentes");
    }
}
