use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::detail::DetailKind;
use super::{Ticket, TicketError, TicketType};
use crate::flow::Scene;

/// Parameters handed to a controller scene.
///
/// Validated detail fields are flattened next to the ticket envelope fields,
/// so the scene sees e.g. `{"uid": 340, "ticket_type": "REDIS_PROXY_CLOSE",
/// "created_by": "admin", "bk_biz_id": 3, "cluster_id": 1111, "force": true}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowParams {
    pub uid: u64,
    pub ticket_type: TicketType,
    pub created_by: String,
    pub bk_biz_id: i64,
    #[serde(flatten)]
    pub details: JsonMap<String, JsonValue>,
}

impl FlowParams {
    pub fn to_ticket_data(&self) -> anyhow::Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowParamBuilder {
    pub detail: DetailKind,
    pub scene: Scene,
    /// Applied after the validated detail is copied; wins over caller input.
    pub overrides: JsonMap<String, JsonValue>,
}

impl FlowParamBuilder {
    pub fn new(detail: DetailKind, scene: Scene) -> Self {
        Self {
            detail,
            scene,
            overrides: JsonMap::new(),
        }
    }

    pub fn with_override(mut self, field: &str, value: JsonValue) -> Self {
        self.overrides.insert(field.to_string(), value);
        self
    }

    pub fn for_ticket_type(ticket_type: TicketType) -> Self {
        match ticket_type {
            // Always forced; there is no caller-facing switch for proxy close.
            TicketType::RedisProxyClose => {
                Self::new(DetailKind::SingleCluster, Scene::RedisClusterOpenClose)
                    .with_override("force", JsonValue::Bool(true))
            }
            TicketType::RedisProxyOpen => {
                Self::new(DetailKind::SingleCluster, Scene::RedisClusterOpenClose)
            }
            TicketType::RedisInstanceClose | TicketType::RedisInstanceOpen => {
                Self::new(DetailKind::ClusterIdList, Scene::RedisInsOpenClose)
            }
            TicketType::VmDisable => Self::new(DetailKind::SingleCluster, Scene::VmDisable),
        }
    }

    pub fn build(&self, ticket: &Ticket) -> Result<FlowParams, TicketError> {
        let mut details = self.detail.validate(ticket.ticket_type, &ticket.details)?;
        for (field, value) in &self.overrides {
            details.insert(field.clone(), value.clone());
        }
        Ok(FlowParams {
            uid: ticket.uid,
            ticket_type: ticket.ticket_type,
            created_by: ticket.created_by.clone(),
            bk_biz_id: ticket.bk_biz_id,
            details,
        })
    }
}
