//! Interface de linha de comando do pipedeck baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (status, watch,
//! show, retry, delete, create, cancel) e flags globais (--interval,
//! --verbose).

use clap::{Parser, Subcommand};

/// pipedeck — painel de acompanhamento do pipeline de vídeo no terminal.
#[derive(Debug, Parser)]
#[command(name = "pipedeck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Intervalo de polling em milissegundos (sobrepõe a configuração).
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mostra uma fotografia atual da fila de processamento.
    Status,

    /// Acompanha a fila ao vivo, atualizando no intervalo configurado.
    Watch,

    /// Mostra os detalhes de um job específico.
    Show {
        /// Identificador do job.
        id: String,
    },

    /// Reenvia um job que falhou para a fila.
    Retry {
        /// Identificador do job.
        id: String,
    },

    /// Remove um job da fila.
    Delete {
        /// Identificador do job.
        id: String,
    },

    /// Cria um novo projeto guiado pelo assistente de múltiplas etapas.
    Create {
        /// Caminho para um arquivo TOML com as respostas de cada etapa.
        #[arg(long)]
        file: Option<String>,

        /// Volta uma etapa no rascunho antes de continuar.
        #[arg(long)]
        back: bool,
    },

    /// Descarta o rascunho persistido do assistente.
    Cancel,
}
