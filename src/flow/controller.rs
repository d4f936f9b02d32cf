use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::{Scene, is_valid_root_id};
use crate::state_layout::{self, atomic_write};

/// Hand-off point to the workflow engine.
///
/// `launch` must return as soon as the scene is accepted; progress is tracked
/// by the engine under `root_id`.
pub trait FlowController: Send + Sync {
    fn launch(&self, scene: Scene, root_id: &str, ticket_data: &JsonValue) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub root_id: String,
    pub scene: Scene,
    pub ticket_data: JsonValue,
    pub launched_at: DateTime<Utc>,
}

/// Spools launch documents under `<state>/flows` for the engine to pick up.
#[derive(Clone, Debug)]
pub struct SpoolController {
    state_dir: PathBuf,
}

impl SpoolController {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn load(&self, root_id: &str) -> anyhow::Result<Option<LaunchRecord>> {
        if !is_valid_root_id(root_id) {
            anyhow::bail!("invalid root id {root_id:?}");
        }
        let path = state_layout::flow_launch_path(&self.state_dir, root_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("read flow launch {}", path.display()))?;
        let record = serde_json::from_str(&contents)
            .with_context(|| format!("parse flow launch {}", path.display()))?;
        Ok(Some(record))
    }
}

impl FlowController for SpoolController {
    fn launch(&self, scene: Scene, root_id: &str, ticket_data: &JsonValue) -> anyhow::Result<()> {
        if !is_valid_root_id(root_id) {
            anyhow::bail!("invalid root id {root_id:?}");
        }
        let path = state_layout::flow_launch_path(&self.state_dir, root_id);
        if path.exists() {
            anyhow::bail!("flow {root_id} already launched at {}", path.display());
        }
        let record = LaunchRecord {
            root_id: root_id.to_string(),
            scene,
            ticket_data: ticket_data.clone(),
            launched_at: Utc::now(),
        };
        atomic_write(&path, &serde_json::to_vec_pretty(&record)?)?;
        debug!(path = %path.display(), "spooled flow launch");
        info!(root_id, scene = %scene, "flow launched");
        Ok(())
    }
}
