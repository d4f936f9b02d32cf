pub mod builder;
pub mod detail;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use builder::{FlowParamBuilder, FlowParams};
pub use registry::{BuilderRegistry, Registration, RegistrationEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    RedisProxyClose,
    RedisProxyOpen,
    RedisInstanceClose,
    RedisInstanceOpen,
    VmDisable,
}

impl TicketType {
    pub const ALL: [TicketType; 5] = [
        TicketType::RedisProxyClose,
        TicketType::RedisProxyOpen,
        TicketType::RedisInstanceClose,
        TicketType::RedisInstanceOpen,
        TicketType::VmDisable,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|ticket_type| ticket_type.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedisProxyClose => "REDIS_PROXY_CLOSE",
            Self::RedisProxyOpen => "REDIS_PROXY_OPEN",
            Self::RedisInstanceClose => "REDIS_INSTANCE_CLOSE",
            Self::RedisInstanceOpen => "REDIS_INSTANCE_OPEN",
            Self::VmDisable => "VM_DISABLE",
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster lifecycle phase a ticket moves its target into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterPhase {
    Online,
    Offline,
}

impl ClusterPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }
}

impl std::fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission action a ticket type is checked against by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IamAction {
    RedisOpenClose,
    VmEnableDisable,
}

impl IamAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedisOpenClose => "redis_open_close",
            Self::VmEnableDisable => "vm_enable_disable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub uid: u64,
    pub ticket_type: TicketType,
    pub bk_biz_id: i64,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ClusterPhase>,
    #[serde(default)]
    pub details: JsonValue,
}

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("invalid {ticket_type} ticket detail: {}", .errors.join("; "))]
    Validation {
        ticket_type: TicketType,
        errors: Vec<String>,
    },
    #[error("no flow builder registered for {ticket_type} in phase {phase}")]
    NotRegistered {
        ticket_type: TicketType,
        phase: ClusterPhase,
    },
    #[error("flow builder for {ticket_type} in phase {phase} registered twice")]
    DuplicateRegistration {
        ticket_type: TicketType,
        phase: ClusterPhase,
    },
    #[error("cannot infer phase for {ticket_type}: {registered} registrations")]
    PhaseUnknown {
        ticket_type: TicketType,
        registered: usize,
    },
    #[error("failed to launch flow {root_id}")]
    Launch {
        root_id: String,
        #[source]
        source: anyhow::Error,
    },
}
