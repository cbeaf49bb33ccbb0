//! Configuration types for CampusFind.
//!
//! [`Config::load`] reads `~/.config/campusfind/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use crate::types::Identity;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[ui]
show_dates            = true
date_format           = "%Y-%m-%d"
detail_pane_width_pct = 40
# "default" or "gruvbox_dark"
theme                 = "default"

[identity]
# user_id = "your-uid"
# email   = "you@campus.edu"

[store]
# "memory" (demo data, nothing persisted) or "dir" (JSON documents under data_dir)
backend = "memory"
# data_dir = "/path/to/campusfind-data"

[keybindings]
toggle_focus   = "Tab"
search_focus   = "/"
cycle_type     = "t"
cycle_category = "c"
new_report     = "n"
delete_report  = "d"
scroll_to_top  = "g"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from `~/.config/campusfind/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

/// `[ui]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_show_dates")]
    pub show_dates: bool,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_detail_pane_width_pct")]
    pub detail_pane_width_pct: u16,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_show_dates() -> bool { true }
fn default_date_format() -> String { "%Y-%m-%d".to_string() }
fn default_detail_pane_width_pct() -> u16 { 40 }
fn default_theme() -> String { "default".to_string() }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_dates: default_show_dates(),
            date_format: default_date_format(),
            detail_pane_width_pct: default_detail_pane_width_pct(),
            theme: default_theme(),
        }
    }
}

/// `[identity]` section. Both keys optional; no `user_id` means anonymous.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl IdentityConfig {
    pub fn identity(&self) -> Option<Identity> {
        let uid = self.user_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(Identity {
            uid: uid.to_string(),
            email: self.email.clone(),
        })
    }
}

/// Which store backs the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Dir,
}

/// `[store]` section of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// `data_dir`, or `~/.local/share/campusfind` when unset.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// `[keybindings]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeybindingsConfig {
    #[serde(default = "default_toggle_focus")]
    pub toggle_focus: String,
    #[serde(default = "default_search_focus")]
    pub search_focus: String,
    #[serde(default = "default_cycle_type")]
    pub cycle_type: String,
    #[serde(default = "default_cycle_category")]
    pub cycle_category: String,
    #[serde(default = "default_new_report")]
    pub new_report: String,
    #[serde(default = "default_delete_report")]
    pub delete_report: String,
    #[serde(default = "default_scroll_to_top")]
    pub scroll_to_top: String,
}

fn default_toggle_focus() -> String { "Tab".to_string() }
fn default_search_focus() -> String { "/".to_string() }
fn default_cycle_type() -> String { "t".to_string() }
fn default_cycle_category() -> String { "c".to_string() }
fn default_new_report() -> String { "n".to_string() }
fn default_delete_report() -> String { "d".to_string() }
fn default_scroll_to_top() -> String { "g".to_string() }

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            toggle_focus: default_toggle_focus(),
            search_focus: default_search_focus(),
            cycle_type: default_cycle_type(),
            cycle_category: default_cycle_category(),
            new_report: default_new_report(),
            delete_report: default_delete_report(),
            scroll_to_top: default_scroll_to_top(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/campusfind/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load an explicit file layered on top of the built-in defaults. The file
    /// must exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("campusfind")
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"))
        .join("campusfind")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
