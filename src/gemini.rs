use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, error};
use serde_json::{json, Value};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.0-flash";

/// Instrução fixa: a resposta deve ser só a legenda, sem conversa.
const SYSTEM_INSTRUCTION: &str =
    "You are a social media engine. Output ONLY the caption. Do not output conversational filler.";

pub struct CaptionGenerator {
    http: reqwest::Client,
    api_key: String,
}

impl CaptionGenerator {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    /// Gera uma legenda para a imagem com o prompt dado. Falhas são
    /// registradas e propagadas: sem legenda não há envio do arquivo.
    pub async fn generate(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String> {
        match self.request(image, mime_type, prompt).await {
            Ok(text) => {
                debug!("Legenda gerada ({} caracteres)", text.len());
                Ok(text)
            }
            Err(e) => {
                error!("Geração Gemini falhou: {e:#}");
                Err(e)
            }
        }
    }

    async fn request(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": mime_type, "data": BASE64.encode(image) } },
                    { "text": prompt },
                ]
            }]
        });

        let url = format!("{GEMINI_ENDPOINT}/{MODEL}:generateContent");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Falha ao contactar a API Gemini")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Gemini retornou status {status}: {body}");
        }

        let response: Value = resp
            .json()
            .await
            .context("Resposta da API Gemini não é JSON válido")?;
        extract_text(&response)
    }
}

/// Extrai o texto da primeira candidata, concatenando as partes de texto.
fn extract_text(response: &Value) -> Result<String> {
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .context("Resposta Gemini sem 'candidates[0].content.parts'")?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    let text = text.trim();
    if text.is_empty() {
        bail!("Resposta Gemini sem campo de texto");
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Legenda pronta.  " }] }
            }]
        });
        assert_eq!(extract_text(&response).unwrap(), "Legenda pronta.");
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Legenda " }, { "text": "em duas partes" }] }
            }]
        });
        assert_eq!(extract_text(&response).unwrap(), "Legenda em duas partes");
    }

    #[test]
    fn test_extract_text_missing_parts() {
        let response = json!({ "candidates": [] });
        assert!(extract_text(&response).is_err());
    }

    #[test]
    fn test_extract_text_without_text_field() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "inline_data": { "mime_type": "image/png" } }] }
            }]
        });
        assert!(extract_text(&response).is_err());
    }
}
