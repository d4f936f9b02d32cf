use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{DnsBackend, DnsOpType, DnsScope, instance_list};
use crate::flow::{FlowStep, InputItem, StepInputs, StepLog};

pub const REDIS_DNS_MANAGE_CODE: &str = "redis_dns_manage";

const INPUTS: &[InputItem] = &[
    InputItem {
        name: "kwargs",
        key: "kwargs",
        required: true,
    },
    InputItem {
        name: "global_data",
        key: "global_data",
        required: true,
    },
];

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DnsManageKwargs {
    pub dns_op_type: String,
    #[serde(default)]
    pub bk_cloud_id: i64,
    #[serde(default)]
    pub exec_ip: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub get_trans_data_ip_var: Option<String>,
    #[serde(default)]
    pub dns_op_exec_port: Option<u16>,
    #[serde(default)]
    pub add_domain_name: Option<String>,
    #[serde(default)]
    pub delete_cluster_id: Option<i64>,
    #[serde(default)]
    pub old_instance: Option<String>,
    #[serde(default)]
    pub new_instance: Option<String>,
    #[serde(default)]
    pub update_domain_name: Option<String>,
}

#[derive(Deserialize)]
struct GlobalData {
    bk_biz_id: i64,
}

/// Cluster domain management step: add, repoint and remove domain records.
pub struct RedisDnsManageService<B> {
    backend: B,
}

impl<B: DnsBackend> RedisDnsManageService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn dispatch(
        &self,
        op: DnsOpType,
        scope: &DnsScope,
        kwargs: &DnsManageKwargs,
        trans_data: &JsonValue,
        log: &mut StepLog,
    ) -> Option<anyhow::Result<bool>> {
        match op {
            DnsOpType::Create => {
                let port = require(log, op, "dns_op_exec_port", kwargs.dns_op_exec_port)?;
                let domain = require(log, op, "add_domain_name", kwargs.add_domain_name.as_deref())?;
                let exec_ips = get_exec_ips(kwargs, trans_data, log);
                if exec_ips.is_empty() {
                    return None;
                }
                let instances = instance_list(&exec_ips, port);
                Some(self.backend.create_domain(scope, &instances, domain))
            }
            DnsOpType::ClusterDelete => {
                let cluster_id = require(log, op, "delete_cluster_id", kwargs.delete_cluster_id)?;
                Some(self.backend.delete_domain(scope, cluster_id))
            }
            DnsOpType::Update => {
                let old_instance = require(log, op, "old_instance", kwargs.old_instance.as_deref())?;
                let new_instance = require(log, op, "new_instance", kwargs.new_instance.as_deref())?;
                let domain = require(
                    log,
                    op,
                    "update_domain_name",
                    kwargs.update_domain_name.as_deref(),
                )?;
                let result = self
                    .backend
                    .update_domain(scope, old_instance, new_instance, domain);
                if let Ok(updated) = &result {
                    log.info(format!(
                        "update domain {domain} from {old_instance} to {new_instance} rst:{updated}"
                    ));
                }
                Some(result)
            }
            DnsOpType::RecycleRecord => {
                let port = require(log, op, "dns_op_exec_port", kwargs.dns_op_exec_port)?;
                let exec_ips = get_exec_ips(kwargs, trans_data, log);
                if exec_ips.is_empty() {
                    return None;
                }
                let instances = instance_list(&exec_ips, port);
                Some(self.backend.recycle_domain_record(scope, &instances))
            }
        }
    }
}

impl<B: DnsBackend> FlowStep for RedisDnsManageService<B> {
    fn code(&self) -> &'static str {
        REDIS_DNS_MANAGE_CODE
    }

    fn inputs_format(&self) -> &'static [InputItem] {
        INPUTS
    }

    fn execute(&self, inputs: &StepInputs, log: &mut StepLog) -> bool {
        let kwargs: DnsManageKwargs = match serde_json::from_value(inputs.kwargs.clone()) {
            Ok(kwargs) => kwargs,
            Err(err) => {
                log.error(format!("invalid dns manage kwargs: {err}"));
                return false;
            }
        };
        let global_data: GlobalData = match serde_json::from_value(inputs.global_data.clone()) {
            Ok(global_data) => global_data,
            Err(err) => {
                log.error(format!("invalid global_data: {err}"));
                return false;
            }
        };
        let Some(op) = DnsOpType::parse(&kwargs.dns_op_type) else {
            log.error(format!(
                "unsupported dns op type, contact the system administrator: {}",
                kwargs.dns_op_type
            ));
            return false;
        };
        let scope = DnsScope {
            bk_biz_id: global_data.bk_biz_id,
            bk_cloud_id: kwargs.bk_cloud_id,
        };
        let Some(result) = self.dispatch(op, &scope, &kwargs, &inputs.trans_data, log) else {
            return false;
        };
        match result {
            Ok(success) => {
                log.info(format!("dns {op} finished, result: {success}"));
                success
            }
            Err(err) => {
                log.error(format!("dns {op} failed: {err:#}"));
                false
            }
        }
    }
}

fn require<T>(log: &mut StepLog, op: DnsOpType, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        log.error(format!("dns {op} requires {field}"));
    }
    value
}

/// Resolve the IPs a step acts on.
///
/// With `get_trans_data_ip_var` set, ticket IPs are merged with the list the
/// flow stored under that name in `trans_data`. A named variable missing from
/// `trans_data` and an empty result are both logged as one error and must fail
/// the step.
pub fn get_exec_ips(
    kwargs: &DnsManageKwargs,
    trans_data: &JsonValue,
    log: &mut StepLog,
) -> Vec<String> {
    let ticket_ips = kwargs.exec_ip.as_deref().unwrap_or_default();
    let pool_ips = match kwargs
        .get_trans_data_ip_var
        .as_deref()
        .map(str::trim)
        .filter(|var| !var.is_empty())
    {
        Some(var) => match trans_data.get(var) {
            Some(JsonValue::Array(items)) => items.clone(),
            Some(JsonValue::Null) | None => {
                log.error(format!(
                    "trans_data has no ip variable {var}, contact the system administrator"
                ));
                return Vec::new();
            }
            Some(other) => vec![other.clone()],
        },
        None => Vec::new(),
    };
    let exec_ips = splice_exec_ips_list(ticket_ips, &pool_ips);
    if exec_ips.is_empty() {
        log.error("no exec ip resolved for this node, contact the system administrator");
    }
    exec_ips
}

/// Merge ticket and pool IPs, deduplicated in first-seen order.
///
/// Entries are plain strings or objects carrying an `ip` field.
pub fn splice_exec_ips_list(ticket_ips: &[JsonValue], pool_ips: &[JsonValue]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ticket_ips
        .iter()
        .chain(pool_ips)
        .filter_map(|entry| match entry {
            JsonValue::String(ip) => Some(ip.trim()),
            JsonValue::Object(map) => map.get("ip").and_then(JsonValue::as_str).map(str::trim),
            _ => None,
        })
        .filter(|ip| !ip.is_empty())
        .filter(|ip| seen.insert(ip.to_string()))
        .map(str::to_string)
        .collect()
}
