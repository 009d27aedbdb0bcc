use log::{error, warn};

use crate::drive::DriveClient;

pub const DEFAULT_PROMPT_LINKEDIN: &str =
    "Write a professional, craftsmanship-focused LinkedIn caption for this image.";
pub const DEFAULT_PROMPT_META: &str =
    "Write a casual, engaging Facebook/Instagram caption for this image.";
pub const DEFAULT_PROMPT_GBP: &str =
    "Write an SEO-heavy Google Business Profile caption for this image with a 'Call us' CTA and no hashtags.";

const FILE_LINKEDIN: &str = "prompt_linkedin.txt";
const FILE_META: &str = "prompt_meta.txt";
const FILE_GBP: &str = "prompt_gbp.txt";

/// De onde veio o texto do prompt — deixa o caminho de fallback
/// verificável sem precisar provocar uma falha real.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    Default,
    Override,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub origin: PromptOrigin,
}

impl Prompt {
    fn default_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            origin: PromptOrigin::Default,
        }
    }
}

/// Os três prompts em vigor durante um ciclo de varredura. Todos os
/// arquivos do ciclo compartilham a mesma fotografia.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub linkedin: Prompt,
    pub meta: Prompt,
    pub gbp: Prompt,
}

impl PromptSet {
    pub fn defaults() -> Self {
        Self {
            linkedin: Prompt::default_text(DEFAULT_PROMPT_LINKEDIN),
            meta: Prompt::default_text(DEFAULT_PROMPT_META),
            gbp: Prompt::default_text(DEFAULT_PROMPT_GBP),
        }
    }

    /// Aplica um override vindo da pasta de configuração. Conteúdo vazio
    /// após o trim não substitui o default; nomes desconhecidos são
    /// ignorados.
    fn apply(&mut self, file_name: &str, content: &str) {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return;
        }
        let slot = match file_name {
            FILE_LINKEDIN => &mut self.linkedin,
            FILE_META => &mut self.meta,
            FILE_GBP => &mut self.gbp,
            _ => return,
        };
        *slot = Prompt {
            text: trimmed.to_string(),
            origin: PromptOrigin::Override,
        };
    }
}

fn is_prompt_file(name: &str) -> bool {
    matches!(name, FILE_LINKEDIN | FILE_META | FILE_GBP)
}

/// Resolve o Prompt Set do ciclo: defaults de fábrica, sobrescritos
/// pelos arquivos da pasta de configuração quando presentes e legíveis.
/// Nunca falha — qualquer problema degrada para o default.
pub async fn resolve(drive: &DriveClient, config_folder: Option<&str>) -> PromptSet {
    let mut set = PromptSet::defaults();
    let Some(folder) = config_folder else {
        return set;
    };

    let files = match drive.list_plain_text(folder).await {
        Ok(files) => files,
        Err(e) => {
            error!("Erro ao listar prompts da pasta de configuração: {e:#}");
            return set;
        }
    };

    for file in files {
        let name = file.name.to_lowercase();
        if !is_prompt_file(&name) {
            continue;
        }
        match drive.download(&file.id).await {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                set.apply(&name, &content);
            }
            Err(e) => warn!("Falha ao ler prompt {}: {e:#}", file.name),
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_origin() {
        let set = PromptSet::defaults();
        assert_eq!(set.linkedin.origin, PromptOrigin::Default);
        assert_eq!(set.meta.origin, PromptOrigin::Default);
        assert_eq!(set.gbp.origin, PromptOrigin::Default);
        assert_eq!(set.linkedin.text, DEFAULT_PROMPT_LINKEDIN);
    }

    #[test]
    fn test_apply_override() {
        let mut set = PromptSet::defaults();
        set.apply(FILE_META, "Casual vibe post");

        assert_eq!(set.meta.text, "Casual vibe post");
        assert_eq!(set.meta.origin, PromptOrigin::Override);
        // Os demais seguem no default
        assert_eq!(set.linkedin.origin, PromptOrigin::Default);
        assert_eq!(set.gbp.origin, PromptOrigin::Default);
    }

    #[test]
    fn test_apply_trims_content() {
        let mut set = PromptSet::defaults();
        set.apply(FILE_GBP, "  Destaque o bairro \n");
        assert_eq!(set.gbp.text, "Destaque o bairro");
    }

    #[test]
    fn test_empty_override_keeps_default() {
        let mut set = PromptSet::defaults();
        set.apply(FILE_LINKEDIN, "   \n\t ");
        assert_eq!(set.linkedin.text, DEFAULT_PROMPT_LINKEDIN);
        assert_eq!(set.linkedin.origin, PromptOrigin::Default);
    }

    #[test]
    fn test_unknown_file_ignored() {
        let mut set = PromptSet::defaults();
        set.apply("prompt_tiktok.txt", "dança");
        assert_eq!(set.linkedin.origin, PromptOrigin::Default);
        assert_eq!(set.meta.origin, PromptOrigin::Default);
        assert_eq!(set.gbp.origin, PromptOrigin::Default);
    }
}
