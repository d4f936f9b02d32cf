use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DnsBackend, DnsScope};
use crate::state_layout::atomic_write;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainRecord {
    pub bk_biz_id: i64,
    pub bk_cloud_id: i64,
    pub domain_name: String,
    pub instance: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsStoreFile {
    #[serde(default)]
    pub records: Vec<DomainRecord>,
    /// Domains owned by each cluster, used by cluster-wide deletes.
    #[serde(default)]
    pub clusters: BTreeMap<i64, Vec<String>>,
}

/// JSON file standing in for the DNS management API.
#[derive(Clone, Debug)]
pub struct FileDnsBackend {
    path: PathBuf,
}

impl FileDnsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> anyhow::Result<DnsStoreFile> {
        if !self.path.exists() {
            return Ok(DnsStoreFile::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read dns store {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parse dns store {}", self.path.display()))
    }

    pub fn save(&self, store: &DnsStoreFile) -> anyhow::Result<()> {
        atomic_write(&self.path, &serde_json::to_vec_pretty(store)?)
    }

    /// Load, apply and save when the store changed.
    ///
    /// There is no file lock: the store assumes a single writer at a time.
    fn mutate<F>(&self, apply: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&mut DnsStoreFile) -> bool,
    {
        let original = self.load()?;
        let mut store = original.clone();
        let result = apply(&mut store);
        store.records.sort();
        store.records.dedup();
        if store != original {
            self.save(&store)?;
            debug!(path = %self.path.display(), "dns store written");
        }
        Ok(result)
    }
}

fn in_scope(record: &DomainRecord, scope: &DnsScope) -> bool {
    record.bk_biz_id == scope.bk_biz_id && record.bk_cloud_id == scope.bk_cloud_id
}

impl DnsBackend for FileDnsBackend {
    fn create_domain(
        &self,
        scope: &DnsScope,
        instance_list: &[String],
        domain_name: &str,
    ) -> anyhow::Result<bool> {
        self.mutate(|store| {
            for instance in instance_list {
                let record = DomainRecord {
                    bk_biz_id: scope.bk_biz_id,
                    bk_cloud_id: scope.bk_cloud_id,
                    domain_name: domain_name.to_string(),
                    instance: instance.clone(),
                };
                if !store.records.contains(&record) {
                    store.records.push(record);
                }
            }
            true
        })
    }

    fn delete_domain(&self, scope: &DnsScope, cluster_id: i64) -> anyhow::Result<bool> {
        self.mutate(|store| {
            let Some(domains) = store.clusters.get(&cluster_id).cloned() else {
                debug!(cluster_id, "cluster has no domain mapping");
                return true;
            };
            let before = store.records.len();
            store.records.retain(|record| {
                !(in_scope(record, scope) && domains.contains(&record.domain_name))
            });
            let removed = before - store.records.len();
            // Domains still resolving in another scope stay mapped to the cluster.
            let remaining = domains
                .into_iter()
                .filter(|domain| {
                    store
                        .records
                        .iter()
                        .any(|record| &record.domain_name == domain)
                })
                .collect::<Vec<_>>();
            if remaining.is_empty() {
                store.clusters.remove(&cluster_id);
                return true;
            }
            store.clusters.insert(cluster_id, remaining);
            removed > 0
        })
    }

    fn update_domain(
        &self,
        scope: &DnsScope,
        old_instance: &str,
        new_instance: &str,
        domain_name: &str,
    ) -> anyhow::Result<bool> {
        self.mutate(|store| {
            let mut updated = false;
            for record in store.records.iter_mut().filter(|record| {
                in_scope(record, scope)
                    && record.domain_name == domain_name
                    && record.instance == old_instance
            }) {
                record.instance = new_instance.to_string();
                updated = true;
            }
            updated
        })
    }

    fn recycle_domain_record(
        &self,
        scope: &DnsScope,
        instance_list: &[String],
    ) -> anyhow::Result<bool> {
        self.mutate(|store| {
            store.records.retain(|record| {
                !(in_scope(record, scope) && instance_list.contains(&record.instance))
            });
            true
        })
    }
}
