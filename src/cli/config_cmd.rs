use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::{FlowSettings, save_settings, settings_path};

#[derive(Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    Show(ConfigShowArgs),
    Set(ConfigSetArgs),
}

#[derive(Parser)]
#[command(
    about = "Show persisted settings.",
    long_about = "Prints the settings file location and its values."
)]
pub struct ConfigShowArgs {}

#[derive(Parser)]
#[command(
    about = "Persist settings.",
    long_about = "Updates only the options that are passed. --state-dir and --dns-store are the global flags.",
    after_help = "Optional options:\n  --state-dir <PATH>\n  --dns-store <PATH>\n  --log-filter <FILTER>"
)]
pub struct ConfigSetArgs {
    #[arg(long)]
    log_filter: Option<String>,
}

/// Global path flags forwarded to `config set`.
pub struct PathFlags {
    pub state_dir: Option<PathBuf>,
    pub dns_store: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn run(self, settings: FlowSettings, flags: PathFlags) -> anyhow::Result<FlowSettings> {
        match self.command {
            ConfigSubcommand::Show(args) => args.run(settings),
            ConfigSubcommand::Set(args) => args.run(settings, flags),
        }
    }
}

fn display_or_unset(path: Option<&PathBuf>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "unset".to_string())
}

impl ConfigShowArgs {
    pub fn run(self, settings: FlowSettings) -> anyhow::Result<FlowSettings> {
        println!("settings: {}", settings_path()?.display());
        println!("state_dir: {}", display_or_unset(settings.state_dir.as_ref()));
        println!("dns_store: {}", display_or_unset(settings.dns_store.as_ref()));
        println!(
            "log_filter: {}",
            settings.log_filter.as_deref().unwrap_or("unset")
        );
        Ok(settings)
    }
}

impl ConfigSetArgs {
    pub fn run(self, mut settings: FlowSettings, flags: PathFlags) -> anyhow::Result<FlowSettings> {
        if flags.state_dir.is_none() && flags.dns_store.is_none() && self.log_filter.is_none() {
            return Err(anyhow::anyhow!("nothing to set"));
        }
        if let Some(state_dir) = flags.state_dir {
            settings.state_dir = Some(state_dir);
        }
        if let Some(dns_store) = flags.dns_store {
            settings.dns_store = Some(dns_store);
        }
        if let Some(log_filter) = self.log_filter {
            settings.log_filter = Some(log_filter);
        }
        save_settings(&settings)?;
        println!("settings saved");
        Ok(settings)
    }
}
