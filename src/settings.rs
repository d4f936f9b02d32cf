use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::state_layout;

pub const CONFIG_DIR_ENV: &str = "DBM_FLOW_CONFIG_DIR";

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct FlowSettings {
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub dns_store: Option<PathBuf>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

pub fn load_settings() -> anyhow::Result<FlowSettings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(FlowSettings::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    let settings: FlowSettings = serde_yaml_bw::from_str(&contents)?;
    Ok(settings)
}

pub fn save_settings(settings: &FlowSettings) -> anyhow::Result<()> {
    let path = settings_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_yaml_bw::to_string(settings)?;
    std::fs::write(&path, contents)?;
    Ok(())
}

pub fn settings_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(Path::new(&value).join("settings.yaml"));
    }
    Ok(project_dirs()?.config_dir().join("settings.yaml"))
}

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("", "dbm", "ticket-flow")
        .ok_or_else(|| anyhow::anyhow!("unable to determine config directory"))
}

impl FlowSettings {
    /// CLI flag, then settings file, then the platform data dir.
    pub fn resolve_state_dir(&self, flag: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.state_dir {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("state"))
    }

    pub fn resolve_dns_store(&self, flag: Option<&Path>, state_dir: &Path) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.dns_store.clone())
            .unwrap_or_else(|| state_layout::default_dns_store_path(state_dir))
    }
}
