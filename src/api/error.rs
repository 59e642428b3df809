//! Tipos de erro da camada de transporte HTTP.
//!
//! Define [`ApiError`] com variantes para sessão ausente/rejeitada, erros
//! HTTP, falhas de rede e corpos malformados. Usa `thiserror` para derivar
//! `Display` e `Error` automaticamente a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o backend do pipeline.
///
/// As variantes cobrem os quatro cenários de falha do transporte:
/// - [`Unauthenticated`](ApiError::Unauthenticated) — sem credencial, ou HTTP 401
/// - [`Http`](ApiError::Http) — qualquer outra resposta fora da faixa 2xx
/// - [`Network`](ApiError::Network) — falha na camada de rede
/// - [`Decode`](ApiError::Decode) — corpo de resposta que não bate com o tipo esperado
#[derive(Debug, Error)]
pub enum ApiError {
    /// Nenhuma credencial presente, ou o backend respondeu 401.
    /// Quando vem de um 401, a sessão já foi encerrada antes do retorno.
    #[error("not authenticated")]
    Unauthenticated,

    /// Resposta HTTP fora da faixa 2xx (exceto 401).
    /// Contém o código de status e a mensagem do corpo da resposta.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Corpo de resposta que não pôde ser decodificado no formato esperado.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Indica se a falha é transitória e a requisição pode ser repetida.
    ///
    /// Erros de rede e respostas 5xx/429 são retentáveis; 4xx é erro do
    /// usuário e corpos malformados não melhoram com repetição.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            ApiError::Unauthenticated | ApiError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display() {
        let err = ApiError::Http {
            status: 404,
            message: "video not found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: video not found");
    }

    #[test]
    fn unauthenticated_display() {
        assert_eq!(ApiError::Unauthenticated.to_string(), "not authenticated");
    }

    #[test]
    fn retryable_classification() {
        assert!(
            ApiError::Http {
                status: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            ApiError::Http {
                status: 429,
                message: "slow down".into()
            }
            .is_retryable()
        );
        assert!(
            !ApiError::Http {
                status: 422,
                message: "bad request".into()
            }
            .is_retryable()
        );
        assert!(!ApiError::Unauthenticated.is_retryable());
        assert!(!ApiError::Decode("unexpected field".into()).is_retryable());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
