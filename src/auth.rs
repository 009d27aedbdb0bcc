use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Renova com folga para não usar um token na iminência de expirar.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: Option<String>,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Token de acesso da service account do Drive, com cache e renovação
/// transparente via assinatura JWT (RS256).
pub struct DriveAuth {
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl DriveAuth {
    /// Constrói a partir do JSON inline da service account. A chave
    /// privada é validada aqui, sem rede.
    pub fn from_json(creds_json: &str, http: reqwest::Client) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(creds_json)
            .context("GOOGLE_CREDS_JSON não é um JSON de service account válido")?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Chave privada da service account inválida")?;
        Ok(Self {
            client_email: key.client_email,
            token_uri: key
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            signing_key,
            http,
            token: Mutex::new(None),
        })
    }

    /// Devolve um token válido, trocando um novo JWT quando o atual
    /// estiver a menos de um minuto de expirar.
    pub async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = Utc::now().timestamp();

        if let Some(cached) = guard.as_ref() {
            if now < cached.expires_at - EXPIRY_MARGIN_SECS {
                return Ok(cached.value.clone());
            }
        }

        let (value, expires_in) = self.exchange(now).await?;
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: now + expires_in,
        });
        debug!("Token do Drive renovado (validade {expires_in}s)");
        Ok(value)
    }

    async fn exchange(&self, now: i64) -> Result<(String, i64)> {
        let claims = Claims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .context("Falha ao assinar o JWT da service account")?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];
        let resp = self
            .http
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .context("Falha ao contactar o endpoint de token do Google")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Troca de token retornou status {status}: {body}");
        }

        let body: TokenResponse = resp
            .json()
            .await
            .context("Resposta do endpoint de token inválida")?;
        Ok((body.access_token, body.expires_in))
    }
}
