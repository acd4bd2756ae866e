use crate::error::{OkrError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const OKR_DIR: &str = ".okr";
pub const CYCLES_DIR: &str = ".okr/cycles";

pub const CONFIG_FILE: &str = ".okr/config.yaml";
pub const STATE_FILE: &str = ".okr/state.yaml";
pub const TEAMS_FILE: &str = ".okr/teams.yaml";
pub const NOTIFICATIONS_FILE: &str = ".okr/notifications.yaml";

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const OBJECTIVES_FILE: &str = "objectives.yaml";
pub const LINKS_FILE: &str = "links.yaml";
pub const CHECKINS_FILE: &str = "checkins.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn okr_dir(root: &Path) -> PathBuf {
    root.join(OKR_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn teams_path(root: &Path) -> PathBuf {
    root.join(TEAMS_FILE)
}

pub fn notifications_path(root: &Path) -> PathBuf {
    root.join(NOTIFICATIONS_FILE)
}

pub fn cycle_dir(root: &Path, slug: &str) -> PathBuf {
    root.join(CYCLES_DIR).join(slug)
}

pub fn cycle_manifest(root: &Path, slug: &str) -> PathBuf {
    cycle_dir(root, slug).join(MANIFEST_FILE)
}

pub fn objectives_path(root: &Path, cycle: &str) -> PathBuf {
    cycle_dir(root, cycle).join(OBJECTIVES_FILE)
}

pub fn links_path(root: &Path, cycle: &str) -> PathBuf {
    cycle_dir(root, cycle).join(LINKS_FILE)
}

pub fn checkins_path(root: &Path, cycle: &str) -> PathBuf {
    cycle_dir(root, cycle).join(CHECKINS_FILE)
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(OkrError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Derive a slug from free text: accents folded, runs of anything else
/// collapsed to a single hyphen, capped at 48 characters.
pub fn slugify(text: &str) -> String {
    let folded = crate::text::fold(text);
    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
        if slug.len() >= 48 {
            break;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "objective".to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["q1-2025", "a", "grow-revenue", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-starts-with-dash", "ends-with-dash-", "has spaces", "UPPER", "a_b"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn slugify_folds_portuguese() {
        assert_eq!(slugify("Expandir operação no Nordeste!"), "expandir-operacao-no-nordeste");
        assert_eq!(slugify("  ***  "), "objective");
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/org");
        assert_eq!(config_path(root), PathBuf::from("/tmp/org/.okr/config.yaml"));
        assert_eq!(
            cycle_manifest(root, "q1"),
            PathBuf::from("/tmp/org/.okr/cycles/q1/manifest.yaml")
        );
        assert_eq!(
            checkins_path(root, "q1"),
            PathBuf::from("/tmp/org/.okr/cycles/q1/checkins.yaml")
        );
    }
}
