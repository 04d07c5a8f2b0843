use conclave_domain::config::EngineConfig;

#[test]
fn default_host_is_wildcard() {
    let config = EngineConfig::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn explicit_host_and_port_parse() {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
    let config: EngineConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
}

#[test]
fn discussion_defaults_match_spec_timeouts() {
    let config = EngineConfig::default();
    assert_eq!(config.discussion.think_timeout_ms, 30_000);
    assert_eq!(config.discussion.svr_deadline_ms, 1_500);
    assert_eq!(config.discussion.publish_timeout_ms, 100);
    assert_eq!(config.discussion.max_duration_secs, 3_600);
    assert_eq!(config.discussion.max_turns, 50);
    assert_eq!(config.discussion.shutdown_grace_secs, 5);
    assert_eq!(config.discussion.stop_threshold, 0.80);
    assert_eq!(config.discussion.min_rounds_before_stop, 2);
    assert_eq!(config.discussion.quality_floor, 0.20);
    assert_eq!(config.discussion.max_substitutions_per_round, 2);
}

#[test]
fn partial_toml_falls_back_to_defaults() {
    let config: EngineConfig = toml::from_str("").unwrap();
    assert_eq!(config.discussion.max_turns, 50);
    assert!(config.backends.platforms.is_empty());
}
