use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_LOGIN_PATH;

pub const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// `None` keeps the session in memory only.
    pub storage_dir: Option<PathBuf>,
    /// `None` uses the built-in directory.
    pub directory_file: Option<PathBuf>,
    pub upload_delay: Duration,
    pub login_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            directory_file: None,
            upload_delay: DEFAULT_UPLOAD_DELAY,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.storage_dir = lookup("PORTAL_STORAGE_DIR").map(PathBuf::from);
        config.directory_file = lookup("PORTAL_DIRECTORY_FILE").map(PathBuf::from);
        if let Some(raw) = lookup("PORTAL_UPLOAD_DELAY_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PORTAL_UPLOAD_DELAY_MS must be milliseconds, got `{}`", raw))?;
            config.upload_delay = Duration::from_millis(millis);
        }
        if let Some(path) = lookup("PORTAL_LOGIN_PATH") {
            if !path.starts_with('/') {
                anyhow::bail!("PORTAL_LOGIN_PATH must start with `/`, got `{}`", path);
            }
            config.login_path = path;
        }
        Ok(config)
    }
}
