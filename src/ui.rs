//! Saída de terminal do pipedeck — tabela da fila e modo watch ao vivo.
//!
//! Usa as crates `console` para estilização com cores e `indicatif` para o
//! spinner exibido enquanto a primeira fotografia da fila é carregada.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{Job, JobStatus};
use crate::store::{Anomaly, MutationKind, is_terminal};

/// Renderização da fila de jobs no terminal.
pub struct QueueView {
    // Estilo verde para jobs publicados.
    green: Style,
    // Estilo vermelho para falhas.
    red: Style,
    // Estilo amarelo para avisos e anomalias.
    yellow: Style,
    // Estilo ciano para jobs em andamento.
    cyan: Style,
    // Estilo apagado para metadados secundários.
    dim: Style,
}

impl QueueView {
    pub fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            dim: Style::new().dim(),
        }
    }

    fn status_style(&self, status: JobStatus) -> &Style {
        match status {
            JobStatus::Uploaded => &self.green,
            JobStatus::Failed => &self.red,
            JobStatus::Processing | JobStatus::Downloaded => &self.cyan,
            JobStatus::Queued => &self.yellow,
        }
    }

    /// Imprime a fila como tabela: id, status e título/origem.
    pub fn render(&self, jobs: &[Job]) {
        if jobs.is_empty() {
            println!("{}", self.dim.apply_to("queue is empty"));
            return;
        }

        println!(
            "{} {} {}",
            self.dim.apply_to(format!("{:<14}", "ID")),
            self.dim.apply_to(format!("{:<12}", "STATUS")),
            self.dim.apply_to("PROJECT")
        );
        for job in jobs {
            let label = job
                .title
                .as_deref()
                .or(job.source_url.as_deref())
                .unwrap_or("-");
            println!(
                "{:<14} {} {}",
                job.id,
                self.status_style(job.status)
                    .apply_to(format!("{:<12}", job.status.to_string())),
                label
            );
            if let Some(error) = &job.error {
                println!("  {}", self.red.apply_to(format!("error: {error}")));
            }
        }

        let active = jobs.iter().filter(|j| !is_terminal(j.status)).count();
        println!(
            "{}",
            self.dim
                .apply_to(format!("{} job(s), {active} active", jobs.len()))
        );
    }

    /// Imprime os detalhes de um único job.
    pub fn render_detail(&self, job: &Job, pending: Option<MutationKind>) {
        println!("id:        {}", job.id);
        println!(
            "status:    {}",
            self.status_style(job.status).apply_to(job.status)
        );
        println!("updated:   {}", job.updated_at.to_rfc3339());
        if let Some(title) = &job.title {
            println!("title:     {title}");
        }
        if let Some(source) = &job.source_url {
            println!("source:    {source}");
        }
        if let Some(video) = &job.video_id {
            println!("video:     {video}");
        }
        if let Some(error) = &job.error {
            println!("error:     {}", self.red.apply_to(error));
        }
        if let Some(kind) = pending {
            println!(
                "pending:   {}",
                self.yellow.apply_to(format!("{kind} awaiting confirmation"))
            );
        }
    }

    /// Exibe uma anomalia de reconciliação sem interromper o watch.
    pub fn render_anomaly(&self, anomaly: &Anomaly) {
        eprintln!("  {} {anomaly}", self.yellow.apply_to("⚠"));
    }
}

impl Default for QueueView {
    fn default() -> Self {
        Self::new()
    }
}

/// Spinner exibido enquanto a primeira fotografia da fila é carregada.
pub struct WatchProgress {
    pb: ProgressBar,
}

impl WatchProgress {
    /// Inicia o spinner com a mensagem fornecida.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    /// Encerra e remove o spinner do terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
