use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    api_url: Option<String>,
    pub timeout: Duration,
    pub session_file: PathBuf,
    /// Lowercase assignee email to task card class.
    pub card_classes: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Task service endpoint. Only commands that talk to the service need it.
    pub fn api_url(&self) -> anyhow::Result<&str> {
        self.api_url
            .as_deref()
            .context("TASKFLOW_API_URL must be set to the task service endpoint")
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("TASKFLOW_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let timeout = match lookup("TASKFLOW_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("TASKFLOW_TIMEOUT_SECS is not a number: {raw}"))?;
                if secs == 0 {
                    bail!("TASKFLOW_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let session_file = match lookup("TASKFLOW_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };

        let card_classes = match lookup("TASKFLOW_CARD_CLASSES") {
            Some(raw) => parse_card_classes(&raw)?,
            None => HashMap::new(),
        };

        Ok(Self {
            api_url,
            timeout,
            session_file,
            card_classes,
        })
    }
}

/// Per-user data directory, never a shared temp dir.
fn default_session_file() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .context("no per-user data directory found; set TASKFLOW_SESSION_FILE")?;
    Ok(base.join("taskflow").join("session.json"))
}

/// Parses `email=class,email=class`.
fn parse_card_classes(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut classes = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (email, class) = entry
            .split_once('=')
            .with_context(|| format!("card class entry `{entry}` is not email=class"))?;
        classes.insert(email.trim().to_lowercase(), class.trim().to_string());
    }
    Ok(classes)
}
