use anyhow::{bail, Context, Result};
use log::{error, info};
use serde::Deserialize;

use crate::auth::DriveAuth;

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";

/// Arquivo como devolvido pela listagem. Transiente: só vale para a
/// tentativa de processamento corrente.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum MimeFilter {
    ImagePrefix,
    PlainText,
}

impl MimeFilter {
    fn clause(self) -> &'static str {
        match self {
            Self::ImagePrefix => "mimeType contains 'image/'",
            Self::PlainText => "mimeType = 'text/plain'",
        }
    }
}

fn listing_query(folder_id: &str, filter: MimeFilter) -> String {
    format!(
        "'{}' in parents and trashed = false and {}",
        folder_id,
        filter.clause()
    )
}

pub struct DriveClient {
    http: reqwest::Client,
    auth: DriveAuth,
}

impl DriveClient {
    /// Conecta e valida as credenciais trocando o primeiro token.
    /// Falha aqui é fatal para o processo.
    pub async fn connect(creds_json: &str, http: reqwest::Client) -> Result<Self> {
        let auth = DriveAuth::from_json(creds_json, http.clone())?;
        let client = Self { http, auth };
        client.auth.access_token().await?;
        Ok(client)
    }

    /// Imagens diretamente sob a pasta, fora da lixeira.
    pub async fn list_images(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        self.list(folder_id, MimeFilter::ImagePrefix).await
    }

    /// Arquivos text/plain diretamente sob a pasta (prompts de configuração).
    pub async fn list_plain_text(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        self.list(folder_id, MimeFilter::PlainText).await
    }

    async fn list(&self, folder_id: &str, filter: MimeFilter) -> Result<Vec<DriveFile>> {
        let query = listing_query(folder_id, filter);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.auth.access_token().await?;
            let mut req = self
                .http
                .get(DRIVE_API)
                .bearer_auth(&token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", "nextPageToken, files(id, name, mimeType)"),
                ]);
            if let Some(t) = &page_token {
                req = req.query(&[("pageToken", t.as_str())]);
            }

            let resp = req.send().await.context("Falha na listagem do Drive")?;
            let status = resp.status();
            if !status.is_success() {
                bail!("Listagem do Drive retornou status {status}");
            }

            let page: FileList = resp
                .json()
                .await
                .context("Resposta de listagem do Drive inválida")?;
            files.extend(page.files);

            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        Ok(files)
    }

    /// Baixa o conteúdo binário completo do arquivo para a memória.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(format!("{DRIVE_API}/{file_id}"))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .context("Falha no download do Drive")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Download do Drive retornou status {status}");
        }

        let bytes = resp
            .bytes()
            .await
            .context("Falha ao ler o corpo do download")?;
        Ok(bytes.to_vec())
    }

    /// Move o arquivo para a pasta destino, removendo todos os pais
    /// atuais. Falhas são registradas e absorvidas: quem chama costuma
    /// estar no caminho de erro e não pode ser interrompido por aqui.
    pub async fn move_file(&self, file_id: &str, destination: &str) {
        match self.try_move(file_id, destination).await {
            Ok(()) => info!("Arquivo {file_id} movido para {destination}"),
            Err(e) => error!("Falha ao mover arquivo {file_id}: {e:#}"),
        }
    }

    async fn try_move(&self, file_id: &str, destination: &str) -> Result<()> {
        #[derive(Deserialize)]
        struct Parents {
            #[serde(default)]
            parents: Vec<String>,
        }

        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(format!("{DRIVE_API}/{file_id}"))
            .bearer_auth(&token)
            .query(&[("fields", "parents")])
            .send()
            .await
            .context("Falha ao consultar os pais do arquivo")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Consulta de pais retornou status {status}");
        }

        let current: Parents = resp
            .json()
            .await
            .context("Resposta de pais do arquivo inválida")?;
        let remove = current.parents.join(",");

        let resp = self
            .http
            .patch(format!("{DRIVE_API}/{file_id}"))
            .bearer_auth(&token)
            .query(&[
                ("addParents", destination),
                ("removeParents", remove.as_str()),
                ("fields", "id, parents"),
            ])
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("Falha na atualização de pais do arquivo")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Atualização de pais retornou status {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_query_images() {
        assert_eq!(
            listing_query("abc123", MimeFilter::ImagePrefix),
            "'abc123' in parents and trashed = false and mimeType contains 'image/'"
        );
    }

    #[test]
    fn test_listing_query_plain_text() {
        assert_eq!(
            listing_query("cfg", MimeFilter::PlainText),
            "'cfg' in parents and trashed = false and mimeType = 'text/plain'"
        );
    }

    #[test]
    fn test_file_list_parse() {
        let json = r#"{
            "nextPageToken": "tok",
            "files": [
                {"id": "1", "name": "a.jpg", "mimeType": "image/jpeg"},
                {"id": "2", "name": "b.png", "mimeType": "image/png"}
            ]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].mime_type, "image/jpeg");
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_file_list_parse_empty() {
        // Drive omite "files" quando a pasta está vazia
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
