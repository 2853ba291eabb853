use gemini_chat_core::config::ApiSettings;
use gemini_chat_core::{Settings, SettingsService, SettingsStore};
use tempfile::TempDir;

// ========================================================================
// Settings (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.api_key, "");
    assert_eq!(settings.selected_model, "gemini-1.5-flash-latest");
    assert!(settings.available_models.is_empty());
    assert!(settings.api.base_url.is_none());
    assert!(settings.api_key().is_none());
}

#[test]
fn test_settings_load_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&temp_dir.path().join("absent.toml"));
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let settings = Settings {
        api_key: "abc".into(),
        selected_model: "gemini-pro".into(),
        available_models: vec!["gemini-pro".into(), "gemini-ultra".into()],
        api: ApiSettings {
            base_url: Some("http://localhost:9999".into()),
            api_key_env: String::new(),
        },
    };
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_env_lookup_is_off_unless_configured() {
    assert!(Settings::default().api.api_key_env.is_empty());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "selected_model = \"gemini-pro\"\n[api]\nbase_url = \"http://x\"\n").unwrap();

    let loaded = Settings::load_from(&path);
    assert!(loaded.api.api_key_env.is_empty());
    assert!(loaded.api_key().is_none());
}

#[test]
fn test_settings_blank_model_in_file_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "api_key = \"k\"\nselected_model = \"  \"\n").unwrap();

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded.api_key, "k");
    assert_eq!(loaded.selected_model, "gemini-1.5-flash-latest");
}

#[test]
fn test_settings_garbage_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "this is [not toml").unwrap();

    assert_eq!(Settings::load_from(&path), Settings::default());
}

#[test]
fn test_settings_api_key_reads_from_env_when_not_stored() {
    std::env::set_var("TEST_GEMINI_CHAT_KEY", " env-key ");

    let mut settings = Settings::default();
    settings.api.api_key_env = "TEST_GEMINI_CHAT_KEY".into();
    assert_eq!(settings.api_key().as_deref(), Some("env-key"));

    settings.api_key = "stored".into();
    assert_eq!(settings.api_key().as_deref(), Some("stored"));

    std::env::remove_var("TEST_GEMINI_CHAT_KEY");
}

#[test]
fn test_settings_build_client_uses_base_url() {
    let mut settings = Settings::default();
    settings.api.base_url = Some("http://127.0.0.1:1234/v1beta/".into());

    let client = settings.build_client().unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:1234/v1beta");
}

// ========================================================================
// SettingsService (SettingsStore impl)
// ========================================================================

#[test]
fn test_store_selected_model_defaults_and_blank_writes() {
    let store = SettingsService::in_memory(Settings::default());
    assert_eq!(store.selected_model(), "gemini-1.5-flash-latest");

    store.set_selected_model("gemini-pro");
    assert_eq!(store.selected_model(), "gemini-pro");

    store.set_selected_model("   ");
    assert_eq!(store.selected_model(), "gemini-1.5-flash-latest");
}

#[test]
fn test_store_credential_is_trimmed() {
    let store = SettingsService::in_memory(Settings::default());
    assert!(store.credential().is_none());

    store.set_credential("  key-123  ");
    assert_eq!(store.credential().as_deref(), Some("key-123"));

    store.set_credential("");
    assert!(store.credential().is_none());
}

#[test]
fn test_store_cached_models_replace() {
    let store = SettingsService::in_memory(Settings::default());
    assert!(store.cached_model_ids().is_empty());

    store.set_cached_model_ids(vec!["a".into(), "b".into()]);
    store.set_cached_model_ids(vec!["c".into()]);
    assert_eq!(store.cached_model_ids(), vec!["c"]);
}

#[test]
fn test_store_persist_writes_backing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let store = SettingsService::open(&path);
    store.set_credential("persisted");
    store.set_selected_model("gemini-pro");
    store.set_cached_model_ids(vec!["gemini-pro".into()]);
    store.persist().unwrap();

    let reopened = SettingsService::open(&path);
    assert_eq!(reopened.credential().as_deref(), Some("persisted"));
    assert_eq!(reopened.selected_model(), "gemini-pro");
    assert_eq!(reopened.cached_model_ids(), vec!["gemini-pro"]);
    assert_eq!(reopened.path(), Some(path.as_path()));
}

#[test]
fn test_store_in_memory_persist_is_noop() {
    let store = SettingsService::in_memory(Settings::default());
    store.set_selected_model("  ");
    assert_eq!(store.snapshot().selected_model, "gemini-1.5-flash-latest");
    store.persist().unwrap();
    assert!(store.path().is_none());
}
