//! Tipos de dados trocados com o backend do pipeline de vídeo.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! no formato `camelCase` usado pelo backend. A decodificação acontece na
//! borda do transporte; nenhum valor não tipado atravessa para o restante
//! do cliente.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de processamento de um job, conforme reportado pelo backend.
///
/// No fio os valores aparecem em caixa alta (`QUEUED`, `PROCESSING`, ...).
/// As transições legais entre estados estão em
/// [`is_valid_transition`](crate::store::is_valid_transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Downloaded,
    Uploaded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Downloaded => write!(f, "DOWNLOADED"),
            JobStatus::Uploaded => write!(f, "UPLOADED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Um job da fila de processamento de vídeo.
///
/// `updated_at` é a versão monotônica atribuída pelo servidor; é ela que
/// ordena snapshots durante a reconciliação. Os demais campos são metadados
/// opacos para o cliente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Identificador opaco, estável durante toda a vida do job.
    pub id: String,
    /// Estado atual de processamento.
    pub status: JobStatus,
    /// Carimbo monotônico atribuído pelo servidor a cada mudança.
    pub updated_at: DateTime<Utc>,
    /// Título do projeto, quando já conhecido.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link de origem do material bruto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Identificador do vídeo derivado, atribuído após o upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Mensagem de erro, presente quando `status == FAILED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Corpo da requisição `POST /videos` montado pelo assistente de criação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    /// Link de origem do material bruto.
    pub source_url: String,
    /// Início do recorte, em segundos.
    pub clip_start_secs: u32,
    /// Fim do recorte, em segundos.
    pub clip_end_secs: u32,
    /// Quantidade de quadros a extrair para miniaturas.
    pub frame_count: u32,
    /// Tópico de pesquisa para enriquecimento, quando habilitado.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_topic: Option<String>,
    /// Título do projeto.
    pub title: String,
    /// Descrição do projeto.
    #[serde(default)]
    pub description: String,
    /// Tags do projeto.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Visibilidade na publicação: `public`, `unlisted` ou `private`.
    pub visibility: String,
    /// Agendamento de publicação, quando definido.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}
