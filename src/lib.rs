pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod gemini;
pub mod poller;
pub mod processor;
pub mod prompts;
pub mod stager;
pub mod webhook;

use anyhow::{Context, Result};

/// Cliente HTTP compartilhado entre Drive, Gemini e webhook.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("captioner/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Falha ao construir o cliente HTTP")
}
