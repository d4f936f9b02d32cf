use std::path::{Path, PathBuf};

use anyhow::Context;

pub fn flows_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("flows")
}

pub fn flow_launch_path(state_dir: &Path, root_id: &str) -> PathBuf {
    flows_dir(state_dir).join(format!("{root_id}.json"))
}

pub fn default_dns_store_path(state_dir: &Path) -> PathBuf {
    state_dir.join("dns").join("records.json")
}

/// Write `bytes` next to `path` and rename into place.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid destination {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create state dir {}", parent.display()))?;
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", path.display()))?;
    let tmp = parent.join(format!(".{file_name}.tmp"));
    std::fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} to {}", tmp.display(), path.display()))?;
    Ok(())
}
