//! Watcher configuration loaded from `flinkwatch.toml`.
//!
//! [`WatchConfig`] holds every tunable. Keys missing from the file fall back
//! to defaults; `FLINKWATCH_REST_URL` and `FLINKWATCH_WEBHOOK_URL` take
//! precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::WatchError;

pub const DEFAULT_CONFIG_FILE: &str = "flinkwatch.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Flink JobManager REST endpoint.
    #[serde(default = "default_flink_rest_url")]
    pub flink_rest_url: String,

    /// Bot webhook for alerts. Empty means alerts are only logged.
    #[serde(default)]
    pub webhook_url: String,

    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Consecutive probe failures before a connectivity alert fires.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,

    /// Directory for daily rolling log files; stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub jobs: Vec<JobTarget>,

    /// How to resubmit jobs. Only targets with their own `sql_file` are
    /// ever restarted; remediation is off entirely when this is absent.
    #[serde(default)]
    pub restart: Option<RestartConfig>,
}

/// One job to watch, selected either by id or by a name substring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobTarget {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub name_contains: Option<String>,
    /// Display name used in alerts when Flink does not report one.
    #[serde(default)]
    pub label: Option<String>,
    /// SQL script that recreates this job. Without it the job is never
    /// resubmitted.
    #[serde(default)]
    pub sql_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Id(&'a str),
    NameContains(&'a str),
}

impl JobTarget {
    #[cfg(test)]
    pub fn by_id(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn by_name(needle: impl Into<String>) -> Self {
        Self {
            name_contains: Some(needle.into()),
            ..Self::default()
        }
    }

    pub fn selector(&self) -> Result<Selector<'_>, WatchError> {
        match (self.job_id.as_deref(), self.name_contains.as_deref()) {
            (Some(id), None) if !id.trim().is_empty() => Ok(Selector::Id(id.trim())),
            (None, Some(needle)) if !needle.trim().is_empty() => {
                Ok(Selector::NameContains(needle.trim()))
            }
            (Some(_), Some(_)) => Err(WatchError::Config(
                "a job target must set only one of `job_id` and `name_contains`".into(),
            )),
            _ => Err(WatchError::Config(
                "a job target needs a non-empty `job_id` or `name_contains`".into(),
            )),
        }
    }

    /// Store key for this target when no concrete job was matched.
    pub fn fallback_key(&self) -> String {
        match self.selector() {
            Ok(Selector::Id(id)) => id.to_string(),
            Ok(Selector::NameContains(needle)) => format!("name:{needle}"),
            Err(_) => "<invalid>".to_string(),
        }
    }
}

/// Settings shared by every restartable target.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
    /// Path to Flink's `sql-client.sh`.
    pub sql_client: PathBuf,
    #[serde(default = "default_cancel_wait_secs")]
    pub cancel_wait_secs: u64,
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
}

fn default_flink_rest_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_status_file() -> PathBuf {
    PathBuf::from("logs/flinkwatch_status.json")
}

fn default_cancel_wait_secs() -> u64 {
    10
}

fn default_submit_timeout_secs() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            flink_rest_url: default_flink_rest_url(),
            webhook_url: String::new(),
            check_interval_secs: default_check_interval_secs(),
            failure_threshold: default_failure_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            status_file: default_status_file(),
            log_dir: None,
            jobs: Vec::new(),
            restart: None,
        }
    }
}

impl WatchConfig {
    /// Load from `path`, or from `flinkwatch.toml` in the current directory.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<WatchConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Environment overrides; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FLINKWATCH_REST_URL").filter(|v| !v.is_empty()) {
            self.flink_rest_url = url;
        }
        if let Some(url) = lookup("FLINKWATCH_WEBHOOK_URL").filter(|v| !v.is_empty()) {
            self.webhook_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.jobs.is_empty() {
            return Err(WatchError::Config(
                "no jobs configured, add at least one [[jobs]] entry".into(),
            ));
        }
        for target in &self.jobs {
            target.selector()?;
            if target.sql_file.is_some() && self.restart.is_none() {
                return Err(WatchError::Config(format!(
                    "job {} sets `sql_file` but there is no [restart] section",
                    target.fallback_key()
                )));
            }
        }
        if self.failure_threshold == 0 {
            return Err(WatchError::Config("failure_threshold must be at least 1".into()));
        }
        if self.check_interval_secs == 0 {
            return Err(WatchError::Config("check_interval_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WatchConfig::default();
        assert_eq!(config.flink_rest_url, "http://localhost:8081");
        assert_eq!(config.check_interval_secs, 60);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.webhook_url.is_empty());
        assert!(config.restart.is_none());
    }

    #[test]
    fn deserialize_full_toml() {
        let toml_str = r#"
            flink_rest_url = "http://flink:8081"
            webhook_url = "https://hook.example/abc"
            check_interval_secs = 30
            log_dir = "logs"

            [[jobs]]
            job_id = "275a6f22da1f5bdf896b9341028b2de0"
            label = "user_interests_cdc"

            [[jobs]]
            name_contains = "kafka"
            sql_file = "/srv/kafka_to_doris.sql"

            [restart]
            sql_client = "/opt/flink/bin/sql-client.sh"
        "#;
        let config: WatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.flink_rest_url, "http://flink:8081");
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(
            config.jobs[0].selector().unwrap(),
            Selector::Id("275a6f22da1f5bdf896b9341028b2de0")
        );
        assert_eq!(
            config.jobs[1].selector().unwrap(),
            Selector::NameContains("kafka")
        );
        assert!(config.jobs[0].sql_file.is_none());
        assert_eq!(
            config.jobs[1].sql_file.as_deref(),
            Some(Path::new("/srv/kafka_to_doris.sql"))
        );
        config.validate().unwrap();
        let restart = config.restart.unwrap();
        assert_eq!(restart.cancel_wait_secs, 10);
        assert_eq!(restart.submit_timeout_secs, 300);
    }

    #[test]
    fn example_config_is_valid() {
        let config: WatchConfig =
            toml::from_str(include_str!("../flinkwatch.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert!(config.restart.is_some());
        // Only the kafka pipeline is resubmitted; the CDC job is watch-only.
        assert!(config.jobs[0].sql_file.is_none());
        assert!(config.jobs[1].sql_file.is_some());
    }

    #[test]
    fn sql_file_requires_restart_section() {
        let config: WatchConfig = toml::from_str(
            r#"
            [[jobs]]
            name_contains = "kafka"
            sql_file = "/srv/kafka_to_doris.sql"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("name:kafka"));
        assert!(err.to_string().contains("[restart]"));
    }

    #[test]
    fn validate_requires_jobs() {
        let err = WatchConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("no jobs configured"));
    }

    #[test]
    fn validate_rejects_ambiguous_target() {
        let config = WatchConfig {
            jobs: vec![JobTarget {
                job_id: Some("a".into()),
                name_contains: Some("b".into()),
                ..JobTarget::default()
            }],
            ..WatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_target() {
        let config = WatchConfig {
            jobs: vec![JobTarget::by_id("  ")],
            ..WatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let config = WatchConfig {
            jobs: vec![JobTarget::by_id("a")],
            failure_threshold: 0,
            ..WatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let config = WatchConfig {
            jobs: vec![JobTarget::by_name("kafka")],
            ..WatchConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = WatchConfig::default();
        config.apply_env(|key| match key {
            "FLINKWATCH_WEBHOOK_URL" => Some("https://hook/env".into()),
            "FLINKWATCH_REST_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.webhook_url, "https://hook/env");
        assert_eq!(config.flink_rest_url, "http://localhost:8081");
    }

    #[test]
    fn fallback_keys() {
        assert_eq!(JobTarget::by_id("abc").fallback_key(), "abc");
        assert_eq!(JobTarget::by_name("kafka").fallback_key(), "name:kafka");
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        std::fs::write(&path, "failure_threshold = 5\n[[jobs]]\njob_id = \"x\"\n").unwrap();

        let config = WatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.jobs.len(), 1);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WatchConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
