// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    all  = { "all", Some(PromptGating::All) },
    oc   = { "OC", Some(PromptGating::Oc) },
    none = { "none", Some(PromptGating::None) },
    junk = { "some", None },
)]
fn gating_parse(input: &str, expected: Option<PromptGating>) {
    assert_eq!(PromptGating::parse(input), expected);
}

#[test]
fn test_config_validates() {
    let dir = tempfile::tempdir().unwrap();
    let config = RelayConfig::for_test(dir.path());
    assert!(config.validate().is_ok());
    assert!(config.is_known_role(&Role::new("admin")));
    assert!(config.is_known_role(&Role::new("vog")));
    assert!(!config.is_known_role(&Role::new("intruder")));
}

#[test]
fn validate_requires_admin_role() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RelayConfig::for_test(dir.path());
    config.roles = vec![Role::new("oc"), Role::new("cc")];
    assert!(matches!(
        config.validate(),
        Err(ConfigError::RolesMissingAdmin)
    ));
}

#[test]
fn validate_rejects_empty_roles() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RelayConfig::for_test(dir.path());
    config.roles.clear();
    assert!(matches!(config.validate(), Err(ConfigError::RolesEmpty)));
}

#[test]
fn validate_rejects_zero_recycle_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RelayConfig::for_test(dir.path());
    config.admin_recycle_cycles = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn defaults_match_documented_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = RelayConfig::for_test(dir.path());
    assert_eq!(config.queue_max_age, Duration::from_secs(300));
    assert_eq!(config.relay_idle_threshold, Duration::from_secs(120));
    assert_eq!(config.session_log_stable_threshold, Duration::from_secs(60));
    assert_eq!(config.ack_timeout, Duration::from_secs(60));
    assert_eq!(config.min_checkpoint_interval, Duration::from_secs(300));
    assert_eq!(config.cooldown_after_checkpoint, Duration::from_secs(120));
    assert_eq!(config.admin_recycle_cycles, 6);
    assert_eq!(config.admin_max_uptime, Duration::from_secs(7200));
    assert!(!config.pane_tail.enabled);
    assert!(config.llm.is_none());
}
