use anyhow::Context;
use dr_client::ResearchClient;
use dr_config::ResearchConfig;
use dr_session::SessionController;

use crate::cli::root_commands::IngestArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::{format_entry, output};
use crate::progress::Progress;

pub async fn handle(
    args: &IngestArgs,
    config: &ResearchConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let client =
        ResearchClient::from_config(&config.server).context("failed to build HTTP client")?;
    let mut controller = SessionController::new(client);

    let progress = Progress::spinner(&format!("Uploading {}", args.file.display()));
    let finished = controller.ingest(&args.file).await?;
    progress.finish_clear();

    let log = controller.state().log();
    match flags.format {
        OutputFormat::Text => {
            for entry in log {
                println!("{}", format_entry(entry));
            }
        }
        OutputFormat::Json | OutputFormat::Raw => output(&log, flags.format)?,
    }

    if !finished {
        anyhow::bail!("upload of '{}' failed", args.file.display());
    }
    Ok(())
}
