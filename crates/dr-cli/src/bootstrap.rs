use anyhow::Context;
use dr_config::ResearchConfig;

use crate::cli::GlobalFlags;

pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<ResearchConfig> {
    let mut config =
        ResearchConfig::load_with_dotenv().context("failed to load deepresearch configuration")?;
    apply_overrides(&mut config, flags)?;
    Ok(config)
}

/// Layer command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut ResearchConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    if let Some(server) = &flags.server {
        config.server.base_url.clone_from(server);
        config
            .validate()
            .with_context(|| format!("invalid --server '{server}'"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;

    fn flags(server: Option<&str>) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Text,
            quiet: false,
            verbose: false,
            server: server.map(str::to_string),
        }
    }

    #[test]
    fn server_flag_overrides_base_url() {
        let mut config = ResearchConfig::default();
        apply_overrides(&mut config, &flags(Some("https://r.example:443"))).unwrap();
        assert_eq!(config.server.base_url, "https://r.example:443");
    }

    #[test]
    fn no_flag_keeps_loaded_value() {
        let mut config = ResearchConfig::default();
        apply_overrides(&mut config, &flags(None)).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8002");
    }

    #[test]
    fn invalid_server_flag_is_rejected() {
        let mut config = ResearchConfig::default();
        let err = apply_overrides(&mut config, &flags(Some("r.example"))).unwrap_err();
        assert!(format!("{err:#}").contains("invalid --server 'r.example'"));
    }
}
