use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run a research session, pausing for plan review.
    Run(RunArgs),
    /// Upload a document into the backend's knowledge base.
    Ingest(IngestArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Research goal.
    pub goal: String,

    /// Approve every proposed plan without prompting.
    #[arg(long)]
    pub approve: bool,
}

#[derive(Clone, Debug, Args)]
pub struct IngestArgs {
    /// Document to upload.
    pub file: PathBuf,
}
