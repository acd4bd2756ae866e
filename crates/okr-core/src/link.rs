use crate::error::{OkrError, Result};
use crate::objective::{self, Objective};
use crate::paths;
use crate::types::ObjectiveType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// LinkConvention
// ---------------------------------------------------------------------------

/// Which end of a link names the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkConvention {
    /// The child declares its parent: `source` is the child, `target` the parent.
    #[default]
    ChildToParent,
    /// The parent declares its child: `source` is the parent, `target` the child.
    ParentToChild,
}

impl LinkConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkConvention::ChildToParent => "child_to_parent",
            LinkConvention::ParentToChild => "parent_to_child",
        }
    }

    /// Split a link into `(parent_id, child_id)` under this convention.
    pub fn parent_child<'a>(self, link: &'a Link) -> (&'a str, &'a str) {
        match self {
            LinkConvention::ChildToParent => (&link.target, &link.source),
            LinkConvention::ParentToChild => (&link.source, &link.target),
        }
    }

    /// Build `(source, target)` for a parent/child pair under this convention.
    pub fn orient<'a>(self, parent: &'a str, child: &'a str) -> (&'a str, &'a str) {
        match self {
            LinkConvention::ChildToParent => (child, parent),
            LinkConvention::ParentToChild => (parent, child),
        }
    }
}

impl fmt::Display for LinkConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validity gate
// ---------------------------------------------------------------------------

/// Whether a `source -> target` link between these objective types is allowed.
///
/// Only one-level parent/child pairs are permitted; strategic and operational
/// objectives can never be linked directly.
pub fn is_valid_link(
    source_type: ObjectiveType,
    target_type: ObjectiveType,
    convention: LinkConvention,
) -> bool {
    use crate::types::ObjectiveType::*;
    match convention {
        LinkConvention::ChildToParent => matches!(
            (source_type, target_type),
            (Tactical, Strategic) | (Operational, Tactical)
        ),
        LinkConvention::ParentToChild => matches!(
            (source_type, target_type),
            (Strategic, Tactical) | (Tactical, Operational)
        ),
    }
}

/// Check a proposed link between two objectives and return its type.
pub fn validate_link(
    source: &Objective,
    target: &Objective,
    convention: LinkConvention,
) -> Result<LinkType> {
    if source.id == target.id {
        return Err(OkrError::SelfLink(source.id.clone()));
    }
    if !is_valid_link(source.objective_type, target.objective_type, convention) {
        return Err(OkrError::InvalidLink {
            source_type: source.objective_type.to_string(),
            target_type: target.objective_type.to_string(),
            convention: convention.to_string(),
        });
    }
    LinkType::between(source.objective_type, target.objective_type).ok_or_else(|| {
        OkrError::InvalidLink {
            source_type: source.objective_type.to_string(),
            target_type: target.objective_type.to_string(),
            convention: convention.to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    StrategicToTactical,
    TacticalToOperational,
    OperationalToTactical,
    TacticalToStrategic,
}

impl LinkType {
    pub fn between(source: ObjectiveType, target: ObjectiveType) -> Option<LinkType> {
        use crate::types::ObjectiveType::*;
        match (source, target) {
            (Strategic, Tactical) => Some(LinkType::StrategicToTactical),
            (Tactical, Operational) => Some(LinkType::TacticalToOperational),
            (Operational, Tactical) => Some(LinkType::OperationalToTactical),
            (Tactical, Strategic) => Some(LinkType::TacticalToStrategic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub link_type: LinkType,
    pub created_at: DateTime<Utc>,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            link_type,
            created_at: Utc::now(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

pub fn load_links(root: &Path, cycle: &str) -> Result<Vec<Link>> {
    crate::io::read_yaml_or_default(&paths::links_path(root, cycle))
}

pub fn save_links(root: &Path, cycle: &str, links: &[Link]) -> Result<()> {
    if !paths::cycle_manifest(root, cycle).exists() {
        return Err(OkrError::CycleNotFound(cycle.to_string()));
    }
    crate::io::write_yaml(&paths::links_path(root, cycle), &links)
}

/// Validate and store a link. Adding an identical link again is a no-op that
/// returns the stored one.
pub fn add_link(
    root: &Path,
    cycle: &str,
    source_id: &str,
    target_id: &str,
    convention: LinkConvention,
) -> Result<Link> {
    let objectives = objective::load_objectives(root, cycle)?;
    let source = objective::find(&objectives, source_id)?;
    let target = objective::find(&objectives, target_id)?;
    let link_type = validate_link(source, target, convention)?;

    let mut links = load_links(root, cycle)?;
    if let Some(existing) = links
        .iter()
        .find(|l| l.source == source_id && l.target == target_id)
    {
        return Ok(existing.clone());
    }
    let link = Link::new(source_id, target_id, link_type);
    links.push(link.clone());
    save_links(root, cycle, &links)?;
    Ok(link)
}

pub fn remove_link(root: &Path, cycle: &str, source_id: &str, target_id: &str) -> Result<Link> {
    let mut links = load_links(root, cycle)?;
    let pos = links
        .iter()
        .position(|l| l.source == source_id && l.target == target_id)
        .ok_or_else(|| OkrError::LinkNotFound {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
        })?;
    let removed = links.remove(pos);
    save_links(root, cycle, &links)?;
    Ok(removed)
}

/// Drop every link with `id` at either end. Returns how many were removed.
pub fn remove_links_touching(root: &Path, cycle: &str, id: &str) -> Result<usize> {
    let mut links = load_links(root, cycle)?;
    let before = links.len();
    links.retain(|l| !l.touches(id));
    let removed = before - links.len();
    if removed > 0 {
        save_links(root, cycle, &links)?;
    }
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::{self, Cycle};
    use tempfile::TempDir;
    use crate::types::ObjectiveType::*;

    #[test]
    fn child_to_parent_table() {
        let c = LinkConvention::ChildToParent;
        assert!(is_valid_link(Tactical, Strategic, c));
        assert!(is_valid_link(Operational, Tactical, c));
        assert!(!is_valid_link(Strategic, Operational, c));
        assert!(!is_valid_link(Strategic, Tactical, c));
        assert!(!is_valid_link(Operational, Strategic, c));
        assert!(!is_valid_link(Tactical, Tactical, c));
    }

    #[test]
    fn parent_to_child_table() {
        let c = LinkConvention::ParentToChild;
        assert!(is_valid_link(Strategic, Tactical, c));
        assert!(is_valid_link(Tactical, Operational, c));
        assert!(!is_valid_link(Tactical, Strategic, c));
        assert!(!is_valid_link(Operational, Tactical, c));
        assert!(!is_valid_link(Strategic, Operational, c));
        assert!(!is_valid_link(Operational, Strategic, c));
    }

    #[test]
    fn link_type_follows_direction() {
        assert_eq!(
            LinkType::between(Tactical, Strategic),
            Some(LinkType::TacticalToStrategic)
        );
        assert_eq!(LinkType::between(Strategic, Operational), None);
    }

    #[test]
    fn parent_child_split() {
        let link = Link::new("t1", "s1", LinkType::TacticalToStrategic);
        assert_eq!(LinkConvention::ChildToParent.parent_child(&link), ("s1", "t1"));
        assert_eq!(LinkConvention::ParentToChild.parent_child(&link), ("t1", "s1"));
        assert_eq!(LinkConvention::ChildToParent.orient("s1", "t1"), ("t1", "s1"));
    }

    fn setup(dir: &TempDir) {
        crate::config::Config::new("acme").save(dir.path()).unwrap();
        crate::state::State::new("acme").save(dir.path()).unwrap();
        cycle::register(dir.path(), Cycle::new("q1", "Q1", "acme"), None).unwrap();
        for (id, t) in [("s1", Strategic), ("t1", Tactical), ("o1", Operational)] {
            objective::create_objective(dir.path(), Objective::new(id, id, t, "q1")).unwrap();
        }
    }

    #[test]
    fn add_link_validates_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let c = LinkConvention::ChildToParent;

        let link = add_link(dir.path(), "q1", "t1", "s1", c).unwrap();
        assert_eq!(link.link_type, LinkType::TacticalToStrategic);
        add_link(dir.path(), "q1", "t1", "s1", c).unwrap();
        assert_eq!(load_links(dir.path(), "q1").unwrap().len(), 1);

        let err = add_link(dir.path(), "q1", "o1", "s1", c).unwrap_err();
        assert!(matches!(err, OkrError::InvalidLink { .. }));
        assert!(err.to_string().contains("operational"));

        assert!(matches!(
            add_link(dir.path(), "q1", "t1", "ghost", c),
            Err(OkrError::ObjectiveNotFound(_))
        ));
    }

    #[test]
    fn remove_and_cascade() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let c = LinkConvention::ChildToParent;
        add_link(dir.path(), "q1", "t1", "s1", c).unwrap();
        add_link(dir.path(), "q1", "o1", "t1", c).unwrap();

        assert_eq!(remove_links_touching(dir.path(), "q1", "t1").unwrap(), 2);
        assert!(load_links(dir.path(), "q1").unwrap().is_empty());
        assert!(matches!(
            remove_link(dir.path(), "q1", "t1", "s1"),
            Err(OkrError::LinkNotFound { .. })
        ));
    }
}
