//! # Configuration
//!
//! Panel settings are declared with [`confique`], which handles layered loading from
//! TOML files and environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `VARHUB_SECRET_MASK`, `VARHUB_PRESERVE_TREE_EXPANSION`.
//! 2. **Explicit file**: passed by the client (`varhub --config path.toml`).
//! 3. **User config**: `varhub.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `default_view` | `home` | View shown when a session starts (`home`, `table`, `matrix`) |
//! | `secret_mask` | `******` | Placeholder displayed instead of secret values |
//! | `name_weight` | `5` | Proportional width of the Name column |
//! | `value_weight` | `15` | Proportional width of the Value column |
//! | `matrix_name_weight` | `20` | Proportional width of the matrix Name column |
//! | `matrix_group_weight` | `15` | Proportional width of each matrix group column |
//! | `preserve_tree_expansion` | `false` | Keep expanded tree nodes across rebuilds |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, VarhubError};
use crate::session::ViewKind;

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// View shown when a session starts: "home" (tree), "table" or "matrix".
    #[config(default = "home")]
    pub default_view: ViewKind,

    /// Placeholder displayed instead of secret values.
    #[config(default = "******", env = "VARHUB_SECRET_MASK")]
    pub secret_mask: String,

    #[config(default = 5)]
    pub name_weight: u16,

    #[config(default = 15)]
    pub value_weight: u16,

    #[config(default = 20)]
    pub matrix_name_weight: u16,

    #[config(default = 15)]
    pub matrix_group_weight: u16,

    /// When set, a tree rebuild keeps nodes expanded if they survive the rebuild.
    #[config(default = false, env = "VARHUB_PRESERVE_TREE_EXPANSION")]
    pub preserve_tree_expansion: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_view: ViewKind::Home,
            secret_mask: "******".to_string(),
            name_weight: 5,
            value_weight: 15,
            matrix_name_weight: 20,
            matrix_group_weight: 15,
            preserve_tree_expansion: false,
        }
    }
}

impl PanelConfig {
    /// Loads env, then `explicit`, then the user config file, then defaults.
    /// Missing files are skipped.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = explicit {
            builder = builder.file(path);
        }
        if let Some(path) = Self::user_config_path() {
            builder = builder.file(path);
        }
        builder.load().map_err(|e| VarhubError::Config(e.to_string()))
    }

    /// Loads a single file on top of the defaults, ignoring env and user config.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::builder()
            .file(path)
            .load()
            .map_err(|e| VarhubError::Config(e.to_string()))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "varhub", "varhub").map(|dirs| dirs.config_dir().join("varhub.toml"))
    }

    /// A commented sample `varhub.toml`.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }

    /// Weight as a widget width: negative means proportional.
    pub fn proportional(weight: u16) -> i32 {
        -i32::from(weight.max(1))
    }
}
