pub mod controller;
pub mod pipeline;
pub mod step;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use controller::{FlowController, LaunchRecord, SpoolController};
pub use pipeline::{Submission, TicketPipeline};
pub use step::{FlowStep, InputItem, StepInputs, StepLog, StepLogEntry, StepLogLevel};

/// Controller entry points a built ticket can be launched into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    #[serde(rename = "redis_cluster_open_close_scene")]
    RedisClusterOpenClose,
    #[serde(rename = "redis_ins_open_close_scene")]
    RedisInsOpenClose,
    #[serde(rename = "vm_disable_scene")]
    VmDisable,
}

impl Scene {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedisClusterOpenClose => "redis_cluster_open_close_scene",
            Self::RedisInsOpenClose => "redis_ins_open_close_scene",
            Self::VmDisable => "vm_disable_scene",
        }
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root id of a flow launch: launch date followed by seven hex digits.
pub fn generate_root_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", Utc::now().format("%Y%m%d"), &suffix[..7])
}

pub fn is_valid_root_id(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|ch| ch.is_ascii_alphanumeric())
}
