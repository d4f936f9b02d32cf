//! Redis metadata consistency reports.
//!
//! Rows are produced by the platform's inspection jobs; this module only
//! knows how each report is titled and which rows it shows.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaCheckSubType {
    AloneInstance,
    StatusAbnormal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFieldFormat {
    Text,
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub name: &'static str,
    pub display_name: &'static str,
    pub format: ReportFieldFormat,
}

const META_CHECK_TITLE: &[ReportField] = &[
    ReportField {
        name: "bk_biz_id",
        display_name: "Business",
        format: ReportFieldFormat::Text,
    },
    ReportField {
        name: "cluster",
        display_name: "Cluster domain",
        format: ReportFieldFormat::Text,
    },
    ReportField {
        name: "cluster_type",
        display_name: "Cluster type",
        format: ReportFieldFormat::Text,
    },
    ReportField {
        name: "status",
        display_name: "Metadata status",
        format: ReportFieldFormat::Status,
    },
    ReportField {
        name: "msg",
        display_name: "Detail",
        format: ReportFieldFormat::Text,
    },
    ReportField {
        name: "create_at",
        display_name: "Checked at",
        format: ReportFieldFormat::Text,
    },
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaCheckReport {
    pub bk_biz_id: i64,
    pub cluster: String,
    pub cluster_type: String,
    pub status: bool,
    pub msg: String,
    pub create_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub subtype: MetaCheckSubType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    MetaCheck,
    AloneInstance,
    StatusAbnormal,
}

impl ReportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "meta_check" | "redis_meta_check" => Some(Self::MetaCheck),
            "alone_instance" => Some(Self::AloneInstance),
            "status_abnormal" => Some(Self::StatusAbnormal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MetaCheck => "redis metadata check",
            Self::AloneInstance => "alone instance check",
            Self::StatusAbnormal => "instance status abnormal check",
        }
    }

    pub fn subtype(&self) -> Option<MetaCheckSubType> {
        match self {
            Self::MetaCheck => None,
            Self::AloneInstance => Some(MetaCheckSubType::AloneInstance),
            Self::StatusAbnormal => Some(MetaCheckSubType::StatusAbnormal),
        }
    }

    pub fn title(&self) -> &'static [ReportField] {
        META_CHECK_TITLE
    }

    pub fn select<'a>(&self, rows: &'a [MetaCheckReport]) -> Vec<&'a MetaCheckReport> {
        rows.iter()
            .filter(|row| self.subtype().is_none_or(|subtype| row.subtype == subtype))
            .collect()
    }

    pub fn page<'a>(&self, rows: &'a [MetaCheckReport]) -> ReportPage<'a> {
        let results = self.select(rows);
        ReportPage {
            name: self.name(),
            title: self.title(),
            count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportPage<'a> {
    pub name: &'static str,
    pub title: &'static [ReportField],
    pub count: usize,
    pub results: Vec<&'a MetaCheckReport>,
}

pub fn load_rows(path: &Path) -> anyhow::Result<Vec<MetaCheckReport>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read report rows {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse report rows {}", path.display()))
}
