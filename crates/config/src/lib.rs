//! Layered settings: built-in defaults, then a config file, then
//! `EXHUME_`-prefixed environment variables (`EXHUME_LAYOUT__HTML_DIR=docs`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exhume_storage::sanitize;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "EXHUME_";
const APPLICATION: &str = "exhume";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: Layout,
    pub restore: Restore,
    pub transform: Transform,
    pub site: Site,
}

/// Names of the things written under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub attachment_dir: String,
    pub html_dir: String,
    /// Folder and group label for pages and attachments that have no better home.
    pub other_bucket: String,
    pub miss_log: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            attachment_dir: "attachments".into(),
            html_dir: "html_pages".into(),
            other_bucket: "Other".into(),
            miss_log: "not_found_attachments.log".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restore {
    /// Write a `<name>.path.txt` marker beside each restored file.
    pub sidecars: bool,
    pub skip_archives: bool,
    /// Decode percent escapes and fold Unicode compatibility forms in
    /// restored filenames.
    pub normalize_names: bool,
}

impl Default for Restore {
    fn default() -> Self {
        Self { sidecars: false, skip_archives: true, normalize_names: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub log_misses: bool,
    pub href_cache_capacity: usize,
}

impl Default for Transform {
    fn default() -> Self {
        Self { log_misses: true, href_cache_capacity: 8192 }
    }
}

impl Transform {
    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.href_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    /// Heading of the navigation index; the space key when unset.
    pub title: Option<String>,
}

impl Config {
    /// The config file looked up when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Assembles every layer without extracting it. A missing file is
    /// skipped rather than treated as an error.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file.map(Path::to_path_buf).or_else(Self::default_path) {
            debug!(file = %file.display(), "config file layer");
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::extract(Self::figment(file))
    }

    pub fn extract(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        segment("layout.attachment_dir", &self.layout.attachment_dir)?;
        segment("layout.html_dir", &self.layout.html_dir)?;
        segment("layout.other_bucket", &self.layout.other_bucket)?;
        segment("layout.miss_log", &self.layout.miss_log)?;
        if self.layout.attachment_dir == self.layout.html_dir {
            exn::bail!(ErrorKind::Invalid {
                key: "layout.html_dir",
                reason: "must differ from layout.attachment_dir".into()
            });
        }
        if self.transform.href_cache_capacity == 0 {
            exn::bail!(ErrorKind::Invalid { key: "transform.href_cache_capacity", reason: "must be non-zero".into() });
        }
        Ok(())
    }
}

/// Directory and file names must be usable as one path segment as-is.
fn segment(key: &'static str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." {
        exn::bail!(ErrorKind::Invalid { key, reason: format!("{value:?} is not a usable name") });
    }
    if sanitize(value) != value {
        exn::bail!(ErrorKind::Invalid { key, reason: format!("{value:?} contains reserved characters") });
    }
    Ok(())
}
