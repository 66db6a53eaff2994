//! Tests for config functionality.

use crate::config::Config;
use crate::locks::StartMethod;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    config.validate().unwrap();

    assert_eq!(config.lock_stale_secs, 3600);
    assert_eq!(config.write_verify_attempts, 3);
    assert!(config.max_workers >= 1);
    assert!(config.initial_workers <= config.max_workers);
    assert_eq!(config.rate_max_calls, 10);
    assert!(config.vendors.is_empty());
}

#[test]
fn empty_yaml_yields_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.lock_stale_secs, 3600);
    assert_eq!(config.write_verify_attempts, 3);
}

#[test]
fn yaml_overrides_are_applied() {
    let yaml = r#"
lock_stale_secs: 600
write_verify_attempts: 5
initial_workers: 1
max_workers: 2
rate_max_calls: 3
rate_window_secs: 10.0
vendors:
  - name: acme
    sources: [news, blog]
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_stale_secs, 600);
    assert_eq!(config.write_verify_attempts, 5);
    assert_eq!(config.max_workers, 2);
    assert_eq!(config.vendors.len(), 1);
    assert_eq!(config.vendors[0].name, "acme");
    assert_eq!(config.vendors[0].sources, vec!["news", "blog"]);
}

#[test]
fn unknown_fields_are_ignored() {
    let yaml = r#"
lock_stale_secs: 900
some_future_setting: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.lock_stale_secs, 900);
}

#[test]
fn zero_stale_timeout_is_rejected() {
    let result = Config::from_yaml("lock_stale_secs: 0");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("lock_stale_secs"));
}

#[test]
fn zero_verify_attempts_is_rejected() {
    let result = Config::from_yaml("write_verify_attempts: 0");
    assert!(result.is_err());
}

#[test]
fn initial_workers_must_not_exceed_max() {
    let result = Config::from_yaml("initial_workers: 9\nmax_workers: 2");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("initial_workers"));
}

#[test]
fn empty_vendor_name_is_rejected() {
    let yaml = r#"
vendors:
  - name: ""
    sources: [news]
"#;
    assert!(Config::from_yaml(yaml).is_err());
}

#[test]
fn config_round_trips_through_yaml() {
    let config = Config::from_yaml("lock_stale_secs: 1234\nmax_workers: 3").unwrap();
    let yaml = config.to_yaml().unwrap();
    let reparsed = Config::from_yaml(&yaml).unwrap();

    assert_eq!(reparsed.lock_stale_secs, 1234);
    assert_eq!(reparsed.max_workers, 3);
}

#[test]
fn lock_settings_carry_config_values() {
    let config = Config::from_yaml("lock_stale_secs: 120\nwrite_verify_attempts: 7").unwrap();
    let settings = config.lock_settings(StartMethod::Web);

    assert_eq!(settings.stale_secs, 120);
    assert_eq!(settings.verify_attempts, 7);
    assert_eq!(settings.start_method, StartMethod::Web);
}
