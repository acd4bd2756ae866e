pub mod checkin;
pub mod config;
pub mod cycle;
pub mod draft;
pub mod init;
pub mod kr;
pub mod link;
pub mod notification;
pub mod objective;
pub mod serve;
pub mod state;
pub mod team;
pub mod view;

use anyhow::Context;
use okr_core::access::{self, Action};
use okr_core::config::Config;
use std::path::Path;

/// Load the config and check that `user` may perform `action`.
pub fn authorize(root: &Path, user: Option<&str>, action: Action) -> anyhow::Result<Config> {
    let config = Config::load(root).context("failed to load config")?;
    access::authorize(&config, user, action)?;
    Ok(config)
}

/// Parse a `--date`-style argument.
pub fn parse_date(raw: &str) -> anyhow::Result<chrono::NaiveDate> {
    Ok(okr_core::cycle::parse_date(raw)?)
}
