use dr_config::ResearchConfig;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

/// Print the effective configuration as JSON.
pub fn handle(config: &ResearchConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let format = match flags.format {
        OutputFormat::Raw => OutputFormat::Raw,
        OutputFormat::Text | OutputFormat::Json => OutputFormat::Json,
    };
    output(config, format)
}
