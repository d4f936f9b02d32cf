//! Ticket detail validation.
//!
//! Every ticket type names a [`DetailKind`]. A raw detail payload is first
//! checked against the kind's JSON Schema so the submitter sees every
//! violation at once, then normalized through the typed struct so defaults
//! are filled in and unknown fields are dropped.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue, json};

use super::{TicketError, TicketType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    SingleCluster,
    ClusterIdList,
}

/// Operations that target one cluster, e.g. proxy open/close.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleClusterDetail {
    pub cluster_id: i64,
    #[serde(default)]
    pub force: bool,
}

/// Instance-level operations across a set of clusters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterIdListDetail {
    pub cluster_ids: Vec<i64>,
    #[serde(default = "default_force")]
    pub force: bool,
}

fn default_force() -> bool {
    true
}

impl DetailKind {
    pub fn schema(&self) -> JsonValue {
        match self {
            Self::SingleCluster => json!({
                "type": "object",
                "required": ["cluster_id"],
                "properties": {
                    "cluster_id": { "type": "integer" },
                    "force": { "type": "boolean" }
                }
            }),
            Self::ClusterIdList => json!({
                "type": "object",
                "required": ["cluster_ids"],
                "properties": {
                    "cluster_ids": { "type": "array", "items": { "type": "integer" } },
                    "force": { "type": "boolean" }
                }
            }),
        }
    }

    /// Compiled once per kind and shared for the life of the process.
    fn validator(&self) -> &'static Result<Validator, String> {
        static SINGLE_CLUSTER: OnceLock<Result<Validator, String>> = OnceLock::new();
        static CLUSTER_ID_LIST: OnceLock<Result<Validator, String>> = OnceLock::new();
        let cell = match self {
            Self::SingleCluster => &SINGLE_CLUSTER,
            Self::ClusterIdList => &CLUSTER_ID_LIST,
        };
        cell.get_or_init(|| jsonschema::validator_for(&self.schema()).map_err(|err| err.to_string()))
    }

    /// Validate `details` and return the normalized field map.
    pub fn validate(
        &self,
        ticket_type: TicketType,
        details: &JsonValue,
    ) -> Result<JsonMap<String, JsonValue>, TicketError> {
        let validator = self.validator().as_ref().map_err(|err| TicketError::Validation {
            ticket_type,
            errors: vec![format!("detail schema does not compile: {err}")],
        })?;
        let errors = validator
            .iter_errors(details)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            return Err(TicketError::Validation {
                ticket_type,
                errors,
            });
        }
        match self {
            Self::SingleCluster => normalize::<SingleClusterDetail>(ticket_type, details),
            Self::ClusterIdList => normalize::<ClusterIdListDetail>(ticket_type, details),
        }
    }
}

fn normalize<T>(
    ticket_type: TicketType,
    details: &JsonValue,
) -> Result<JsonMap<String, JsonValue>, TicketError>
where
    T: DeserializeOwned + Serialize,
{
    let invalid = |err: serde_json::Error| TicketError::Validation {
        ticket_type,
        errors: vec![err.to_string()],
    };
    let typed: T = serde_json::from_value(details.clone()).map_err(invalid)?;
    match serde_json::to_value(typed).map_err(invalid)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(TicketError::Validation {
            ticket_type,
            errors: vec![format!("detail normalized to non-object {other}")],
        }),
    }
}
