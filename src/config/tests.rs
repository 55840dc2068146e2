use super::{
    load_config_file, log_config_path, parse_duration_value, resolve,
    types::{ConfigFile, DurationValue},
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::TrainArgs;
use crate::error::{AppError, ConfigError};

fn args(extra: &[&str]) -> Result<TrainArgs, String> {
    let mut argv = vec!["train", "train.toml"];
    argv.extend_from_slice(extra);
    TrainArgs::try_parse_from(argv).map_err(|err| format!("parse failed: {}", err))
}

fn parse_toml(content: &str) -> Result<ConfigFile, String> {
    toml::from_str(content).map_err(|err| format!("toml failed: {}", err))
}

#[test]
fn parse_toml_config_with_pipeline() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("train.toml");
    let content = r#"
[train]
workers = 3
log_config = "log.toml"
requests = ["a.req", "b.req"]
drain_interval = "250ms"

[pipeline]
filters = ["require_header", "rate_limit"]

[pipeline.rate_limit]
limit = 10
period = "1m"

[pipeline.require_header]
header = "X-Auth-Token"
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let train = config.train.as_ref().ok_or("Expected [train]")?;
    if train.workers != Some(3) {
        return Err("Unexpected workers".to_owned());
    }
    let pipeline = config.pipeline.as_ref().ok_or("Expected [pipeline]")?;
    if pipeline.filters != ["require_header", "rate_limit"] {
        return Err(format!("Unexpected filters: {:?}", pipeline.filters));
    }
    let rate_limit = pipeline.rate_limit.as_ref().ok_or("Expected rate_limit")?;
    if rate_limit.limit != 10 {
        return Err("Unexpected limit".to_owned());
    }
    if !matches!(&rate_limit.period, Some(DurationValue::Text(text)) if text == "1m") {
        return Err("Unexpected period".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("train.json");
    let content = r#"{
        "train": { "workers": 2, "drain_interval": 5 },
        "pipeline": { "filters": [] }
    }"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let drain = config
        .train
        .as_ref()
        .and_then(|train| train.drain_interval.as_ref())
        .ok_or("Expected drain_interval")?;
    if !matches!(drain, DurationValue::Seconds(5)) {
        return Err("Unexpected drain_interval".to_owned());
    }
    if config.pipeline.is_none() {
        return Err("Expected [pipeline]".to_owned());
    }
    Ok(())
}

#[test]
fn unsupported_and_missing_extensions_are_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let ini = dir.path().join("train.ini");
    let bare = dir.path().join("train");
    std::fs::write(&ini, "[pipeline]\n").map_err(|err| format!("write failed: {}", err))?;
    std::fs::write(&bare, "[pipeline]\n").map_err(|err| format!("write failed: {}", err))?;

    if !matches!(
        load_config_file(&ini),
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "ini"
    ) {
        return Err("Expected UnsupportedExtension".to_owned());
    }
    if !matches!(
        load_config_file(&bare),
        Err(AppError::Config(ConfigError::MissingExtension))
    ) {
        return Err("Expected MissingExtension".to_owned());
    }
    if !matches!(
        load_config_file(&dir.path().join("absent.toml")),
        Err(AppError::Config(ConfigError::ReadConfig { .. }))
    ) {
        return Err("Expected ReadConfig".to_owned());
    }
    Ok(())
}

#[test]
fn resolve_requires_pipeline_section() -> Result<(), String> {
    let config = parse_toml("[train]\nrequests = [\"a.req\"]\n")?;
    match resolve(&args(&[])?, config) {
        Err(ConfigError::MissingPipeline) => Ok(()),
        other => Err(format!("Expected MissingPipeline, got {:?}", other.map(|s| s.requests))),
    }
}

#[test]
fn resolve_requires_request_files() -> Result<(), String> {
    let config = parse_toml("[pipeline]\n")?;
    match resolve(&args(&[])?, config) {
        Err(ConfigError::NoRequestFiles) => Ok(()),
        other => Err(format!("Expected NoRequestFiles, got {:?}", other.map(|s| s.requests))),
    }
}

#[test]
fn resolve_appends_config_requests_after_cli_requests() -> Result<(), String> {
    let config = parse_toml("[train]\nrequests = [\"b.req\", \"c.req\"]\n[pipeline]\n")?;
    let settings = resolve(&args(&["a.req"])?, config).map_err(|err| err.to_string())?;
    let expected: Vec<PathBuf> = ["a.req", "b.req", "c.req"].iter().map(PathBuf::from).collect();
    if settings.requests != expected {
        return Err(format!("Unexpected requests: {:?}", settings.requests));
    }
    Ok(())
}

#[test]
fn resolve_defaults() -> Result<(), String> {
    let config = parse_toml("[pipeline]\nfilters = []\n")?;
    let settings = resolve(&args(&["a.req"])?, config).map_err(|err| err.to_string())?;
    if settings.workers.get() != 1 {
        return Err("Expected one worker by default".to_owned());
    }
    if settings.drain_interval != Duration::from_secs(1) {
        return Err("Expected one second drain interval".to_owned());
    }
    if settings.log_config.is_some() {
        return Err("Expected no log config".to_owned());
    }
    Ok(())
}

#[test]
fn resolve_prefers_cli_over_config() -> Result<(), String> {
    let config =
        parse_toml("[train]\nworkers = 8\nlog_config = \"file.toml\"\n[pipeline]\n")?;
    let cli = args(&["a.req", "-w", "2", "-l", "cli.toml"])?;
    if log_config_path(&cli, &config).as_deref() != Some(Path::new("cli.toml")) {
        return Err("Expected CLI log config".to_owned());
    }
    let settings = resolve(&cli, config).map_err(|err| err.to_string())?;
    if settings.workers.get() != 2 {
        return Err("Expected CLI workers".to_owned());
    }

    let config = parse_toml("[train]\nworkers = 8\nlog_config = \"file.toml\"\n[pipeline]\n")?;
    let settings = resolve(&args(&["a.req"])?, config).map_err(|err| err.to_string())?;
    if settings.workers.get() != 8 {
        return Err("Expected config workers".to_owned());
    }
    if settings.log_config.as_deref() != Some(Path::new("file.toml")) {
        return Err("Expected config log config".to_owned());
    }
    Ok(())
}

#[test]
fn resolve_rejects_invalid_train_values() -> Result<(), String> {
    let config = parse_toml("[train]\nworkers = 0\n[pipeline]\n")?;
    if !matches!(
        resolve(&args(&["a.req"])?, config),
        Err(ConfigError::FieldMustBePositive { .. })
    ) {
        return Err("Expected FieldMustBePositive".to_owned());
    }

    let config = parse_toml("[train]\ndrain_interval = \"soon\"\n[pipeline]\n")?;
    if !matches!(
        resolve(&args(&["a.req"])?, config),
        Err(ConfigError::InvalidDuration { .. })
    ) {
        return Err("Expected InvalidDuration".to_owned());
    }
    Ok(())
}

#[test]
fn parse_duration_value_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("5", Duration::from_secs(5)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (text, expected) in cases {
        let parsed = parse_duration_value(text).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("Unexpected duration for {}: {:?}", text, parsed));
        }
    }
    for text in ["", "ms", "0s", "3d"] {
        if parse_duration_value(text).is_ok() {
            return Err(format!("Expected {:?} to be rejected", text));
        }
    }
    Ok(())
}
