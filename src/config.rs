//! Configuração do pipedeck carregada a partir de `pipedeck.toml`.
//!
//! A struct [`PipedeckConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `PIPEDECK_API_TOKEN` e `PIPEDECK_API_URL`
//! têm precedência sobre o arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Configuração de nível superior carregada de `pipedeck.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipedeckConfig {
    /// URL base do backend do pipeline (sem barra final).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Token de acesso (bearer) para o backend.
    #[serde(default)]
    pub api_token: String,

    /// Intervalo base de polling da fila, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Teto do backoff exponencial após falhas, em milissegundos.
    #[serde(default = "default_backoff_ceiling_ms")]
    pub backoff_ceiling_ms: u64,

    /// Caminho do rascunho persistido do assistente de criação.
    #[serde(default = "default_draft_path")]
    pub draft_path: String,
}

// Valor padrão para a URL do backend em desenvolvimento local.
fn default_api_url() -> String {
    "http://localhost:8787/api".to_string()
}

// Valor padrão para o intervalo de polling: 5s.
fn default_poll_interval_ms() -> u64 {
    5000
}

// Valor padrão para o teto do backoff: 60s.
fn default_backoff_ceiling_ms() -> u64 {
    60_000
}

// Valor padrão para o caminho do rascunho.
fn default_draft_path() -> String {
    ".pipedeck-draft.json".to_string()
}

impl Default for PipedeckConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            backoff_ceiling_ms: default_backoff_ceiling_ms(),
            draft_path: default_draft_path(),
        }
    }
}

impl PipedeckConfig {
    /// Carrega a configuração de `pipedeck.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new("pipedeck.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PipedeckConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo.
        if let Ok(token) = std::env::var("PIPEDECK_API_TOKEN")
            && !token.is_empty()
        {
            config.api_token = token;
        }
        if let Ok(url) = std::env::var("PIPEDECK_API_URL")
            && !url.is_empty()
        {
            config.api_url = url;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = PipedeckConfig::default();
        assert_eq!(config.api_url, "http://localhost:8787/api");
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.backoff_ceiling_ms, 60_000);
        assert_eq!(config.draft_path, ".pipedeck-draft.json");
        assert!(config.api_token.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_token = "tok-test-123"
            poll_interval_ms = 2000
        "#;
        let config: PipedeckConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_token, "tok-test-123");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.api_url, "http://localhost:8787/api");
        assert_eq!(config.backoff_ceiling_ms, 60_000);
    }
}
