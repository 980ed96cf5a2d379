use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&temp.path().join("missing.toml"), env_from(&[]));

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.request_timeout(), Duration::from_secs(15));
}

#[test]
fn file_values_override_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("console.toml");
    fs::write(
        &path,
        "api_url = \"https://templates.example.com\"\nrequest_timeout_secs = 30\n",
    )
    .expect("write");

    let settings = load_settings_from(&path, env_from(&[]));

    assert_eq!(settings.api_url, "https://templates.example.com");
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.session_db, Settings::default().session_db);
}

#[test]
fn env_overrides_file_and_prefixed_name_wins() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("console.toml");
    fs::write(&path, "api_url = \"http://from-file\"\n").expect("write");

    let settings = load_settings_from(
        &path,
        env_from(&[
            ("TEMPLATE_API_URL", "http://legacy"),
            ("APP__API_URL", "http://prefixed"),
            ("APP__SESSION_DB", "sqlite::memory:"),
            ("APP__REQUEST_TIMEOUT_SECS", "nope"),
        ]),
    );

    assert_eq!(settings.api_url, "http://prefixed");
    assert_eq!(settings.session_db, "sqlite::memory:");
    assert_eq!(settings.request_timeout_secs, 15);
}

#[test]
fn malformed_file_is_ignored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("console.toml");
    fs::write(&path, "api_url = [").expect("write");

    assert_eq!(load_settings_from(&path, env_from(&[])), Settings::default());
}

#[test]
fn zero_timeout_is_clamped() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
}
