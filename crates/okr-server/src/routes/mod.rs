pub mod checkins;
pub mod config;
pub mod cycles;
pub mod drafts;
pub mod links;
pub mod notifications;
pub mod objectives;
pub mod state;
pub mod teams;

use okr_core::access::{self, Action};
use okr_core::config::Config;
use std::path::Path;

/// Load the config and check that `user` may perform `action`.
///
/// Returns the config so handlers can read link settings without a second load.
pub(crate) fn authorize(root: &Path, user: Option<&str>, action: Action) -> okr_core::Result<Config> {
    let config = Config::load(root)?;
    if let Err(e) = access::authorize(&config, user, action) {
        tracing::warn!(user = user.unwrap_or("<none>"), %action, "request denied");
        return Err(e);
    }
    Ok(config)
}

/// Parse an optional `YYYY-MM-DD` field from a request body. Blank is `None`.
pub(crate) fn parse_opt_date(raw: Option<&str>) -> okr_core::Result<Option<chrono::NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => okr_core::cycle::parse_date(s).map(Some),
        None => Ok(None),
    }
}
