// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::PathBuf;

pub static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("dev.haven", "Haven", "haven"));

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const DEFAULT_PERCENTAGE_LIMIT: u32 = 5;
pub const DEFAULT_RECENT_LIMIT: u32 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Overrides the platform data dir location of the SQLite file.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    pub page_limit: u32,
    pub percentage_limit: u32,
    pub recent_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: None,
            log_level: "info".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            percentage_limit: DEFAULT_PERCENTAGE_LIMIT,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl Settings {
    /// Defaults, then `haven.toml` from the platform config dir, then `HAVEN_*` env vars.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("page_limit", DEFAULT_PAGE_LIMIT as i64)?
            .set_default("percentage_limit", DEFAULT_PERCENTAGE_LIMIT as i64)?
            .set_default("recent_limit", DEFAULT_RECENT_LIMIT as i64)?;

        if let Some(proj) = ProjectDirs::from(APP.0, APP.1, APP.2) {
            builder = builder.add_source(File::from(proj.config_dir().join("haven.toml")).required(false));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("HAVEN"))
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 || self.percentage_limit == 0 || self.recent_limit == 0 {
            anyhow::bail!("Configured limits must be greater than zero");
        }
        Ok(())
    }
}
