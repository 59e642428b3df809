use crate::api::JobStatus;

/// Legal forward edges of the backend pipeline, as observable by the client:
///
/// QUEUED → PROCESSING → DOWNLOADED → UPLOADED, with FAILED reachable from
/// any non-terminal state.
///
/// This guards *locally inferred* transitions only. An authoritative
/// snapshot (strictly newer `updated_at`) replaces the cached state
/// unconditionally and never consults this function.
pub fn is_valid_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Queued, Processing)
            | (Processing, Downloaded)
            | (Downloaded, Uploaded)
            | (Queued, Failed)
            | (Processing, Failed)
            | (Downloaded, Failed)
    )
}

/// True for states that can never change again without backend intervention.
pub fn is_terminal(status: JobStatus) -> bool {
    matches!(status, JobStatus::Uploaded | JobStatus::Failed)
}
