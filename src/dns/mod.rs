pub mod service;
pub mod store;

use serde::{Deserialize, Serialize};

pub use service::{
    DnsManageKwargs, REDIS_DNS_MANAGE_CODE, RedisDnsManageService, get_exec_ips,
    splice_exec_ips_list,
};
pub use store::FileDnsBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsOpType {
    Create,
    ClusterDelete,
    Update,
    RecycleRecord,
}

impl DnsOpType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create" => Some(Self::Create),
            "cluster_delete" => Some(Self::ClusterDelete),
            "update" => Some(Self::Update),
            "recycle_record" => Some(Self::RecycleRecord),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ClusterDelete => "cluster_delete",
            Self::Update => "update",
            Self::RecycleRecord => "recycle_record",
        }
    }
}

impl std::fmt::Display for DnsOpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business and cloud area every DNS call is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsScope {
    pub bk_biz_id: i64,
    pub bk_cloud_id: i64,
}

/// DNS management backend. Instances are spelled `ip#port`.
///
/// Each call is one mutating round trip; `Ok(false)` means the backend
/// refused or matched nothing.
pub trait DnsBackend: Send + Sync {
    fn create_domain(
        &self,
        scope: &DnsScope,
        instance_list: &[String],
        domain_name: &str,
    ) -> anyhow::Result<bool>;

    fn delete_domain(&self, scope: &DnsScope, cluster_id: i64) -> anyhow::Result<bool>;

    fn update_domain(
        &self,
        scope: &DnsScope,
        old_instance: &str,
        new_instance: &str,
        domain_name: &str,
    ) -> anyhow::Result<bool>;

    fn recycle_domain_record(
        &self,
        scope: &DnsScope,
        instance_list: &[String],
    ) -> anyhow::Result<bool>;
}

pub fn instance_list(ips: &[String], port: u16) -> Vec<String> {
    ips.iter().map(|ip| format!("{ip}#{port}")).collect()
}
