use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use dbm_ticket_flow::settings::{CONFIG_DIR_ENV, FlowSettings, load_settings, save_settings};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

#[test]
fn load_settings_defaults_when_missing() {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let temp = tempfile::tempdir().unwrap();
    unsafe {
        std::env::set_var(CONFIG_DIR_ENV, temp.path());
    }
    let settings = load_settings().unwrap();
    assert_eq!(settings, FlowSettings::default());
    unsafe {
        std::env::remove_var(CONFIG_DIR_ENV);
    }
}

#[test]
fn save_and_load_settings_roundtrip() {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let temp = tempfile::tempdir().unwrap();
    unsafe {
        std::env::set_var(CONFIG_DIR_ENV, temp.path());
    }
    let settings = FlowSettings {
        state_dir: Some(temp.path().join("state")),
        dns_store: None,
        log_filter: Some("dbm_ticket_flow=debug".to_string()),
    };
    save_settings(&settings).unwrap();
    assert!(temp.path().join("settings.yaml").exists());

    let loaded = load_settings().unwrap();
    assert_eq!(loaded, settings);
    let state_dir = loaded.resolve_state_dir(None).unwrap();
    assert_eq!(
        loaded.resolve_dns_store(None, &state_dir),
        temp.path().join("state").join("dns").join("records.json")
    );
    assert_eq!(
        loaded.resolve_dns_store(Some(Path::new("/tmp/records.json")), &state_dir),
        PathBuf::from("/tmp/records.json")
    );
    unsafe {
        std::env::remove_var(CONFIG_DIR_ENV);
    }
}
