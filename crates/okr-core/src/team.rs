//! Teams and their many-to-many assignment to key results.
//!
//! Layout:
//!   .okr/teams.yaml  : every team with the key-result ids assigned to it

use crate::error::{OkrError, Result};
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub key_results: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            members: Vec::new(),
            key_results: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal file I/O
// ---------------------------------------------------------------------------

pub fn load_teams(root: &Path) -> Result<Vec<Team>> {
    io::read_yaml_or_default(&paths::teams_path(root))
}

fn save_teams(root: &Path, teams: &[Team]) -> Result<()> {
    io::write_yaml(&paths::teams_path(root), &teams)
}

fn find_mut<'a>(teams: &'a mut [Team], slug: &str) -> Result<&'a mut Team> {
    teams
        .iter_mut()
        .find(|t| t.slug == slug)
        .ok_or_else(|| OkrError::TeamNotFound(slug.to_string()))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn create_team(root: &Path, team: Team) -> Result<Team> {
    paths::validate_slug(&team.slug)?;
    let mut teams = load_teams(root)?;
    if teams.iter().any(|t| t.slug == team.slug) {
        return Err(OkrError::TeamExists(team.slug));
    }
    teams.push(team.clone());
    save_teams(root, &teams)?;
    Ok(team)
}

pub fn load_team(root: &Path, slug: &str) -> Result<Team> {
    load_teams(root)?
        .into_iter()
        .find(|t| t.slug == slug)
        .ok_or_else(|| OkrError::TeamNotFound(slug.to_string()))
}

/// Assign a key result to a team. Assigning twice is a no-op.
///
/// Callers are expected to have checked that the key result exists.
pub fn assign(root: &Path, slug: &str, kr_id: &str) -> Result<Team> {
    let mut teams = load_teams(root)?;
    let team = find_mut(&mut teams, slug)?;
    if !team.key_results.iter().any(|k| k == kr_id) {
        team.key_results.push(kr_id.to_string());
    }
    let team = team.clone();
    save_teams(root, &teams)?;
    Ok(team)
}

pub fn unassign(root: &Path, slug: &str, kr_id: &str) -> Result<Team> {
    let mut teams = load_teams(root)?;
    let team = find_mut(&mut teams, slug)?;
    team.key_results.retain(|k| k != kr_id);
    let team = team.clone();
    save_teams(root, &teams)?;
    Ok(team)
}

pub fn add_member(root: &Path, slug: &str, user: &str) -> Result<Team> {
    let mut teams = load_teams(root)?;
    let team = find_mut(&mut teams, slug)?;
    if !team.members.iter().any(|m| m == user) {
        team.members.push(user.to_string());
    }
    let team = team.clone();
    save_teams(root, &teams)?;
    Ok(team)
}

/// Drop the given key results from every team. Used by cascading deletes.
pub fn unassign_everywhere(root: &Path, kr_ids: &[String]) -> Result<usize> {
    if kr_ids.is_empty() || !paths::teams_path(root).exists() {
        return Ok(0);
    }
    let mut teams = load_teams(root)?;
    let mut removed = 0;
    for team in &mut teams {
        let before = team.key_results.len();
        team.key_results.retain(|k| !kr_ids.contains(k));
        removed += before - team.key_results.len();
    }
    if removed > 0 {
        save_teams(root, &teams)?;
    }
    Ok(removed)
}

/// Teams a key result is assigned to.
pub fn teams_for<'a>(teams: &'a [Team], kr_id: &str) -> Vec<&'a Team> {
    teams
        .iter()
        .filter(|t| t.key_results.iter().any(|k| k == kr_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_and_reject_duplicate() {
        let dir = TempDir::new().unwrap();
        create_team(dir.path(), Team::new("growth", "Growth")).unwrap();
        assert!(matches!(
            create_team(dir.path(), Team::new("growth", "Again")),
            Err(OkrError::TeamExists(_))
        ));
        assert!(matches!(
            create_team(dir.path(), Team::new("Bad Slug", "x")),
            Err(OkrError::InvalidSlug(_))
        ));
        assert_eq!(load_teams(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn assign_is_idempotent_and_many_to_many() {
        let dir = TempDir::new().unwrap();
        create_team(dir.path(), Team::new("growth", "Growth")).unwrap();
        create_team(dir.path(), Team::new("sales", "Sales")).unwrap();

        assign(dir.path(), "growth", "grow-kr1").unwrap();
        assign(dir.path(), "growth", "grow-kr1").unwrap();
        assign(dir.path(), "sales", "grow-kr1").unwrap();

        let teams = load_teams(dir.path()).unwrap();
        assert_eq!(teams[0].key_results, vec!["grow-kr1"]);
        assert_eq!(teams_for(&teams, "grow-kr1").len(), 2);

        let t = unassign(dir.path(), "sales", "grow-kr1").unwrap();
        assert!(t.key_results.is_empty());
        assert!(matches!(
            assign(dir.path(), "ghost", "grow-kr1"),
            Err(OkrError::TeamNotFound(_))
        ));
    }

    #[test]
    fn cascade_removes_from_all_teams() {
        let dir = TempDir::new().unwrap();
        assert_eq!(unassign_everywhere(dir.path(), &["x".into()]).unwrap(), 0);

        create_team(dir.path(), Team::new("a", "A")).unwrap();
        create_team(dir.path(), Team::new("b", "B")).unwrap();
        assign(dir.path(), "a", "o-kr1").unwrap();
        assign(dir.path(), "a", "o-kr2").unwrap();
        assign(dir.path(), "b", "o-kr1").unwrap();

        let removed = unassign_everywhere(dir.path(), &["o-kr1".into()]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(load_team(dir.path(), "a").unwrap().key_results, vec!["o-kr2"]);
    }

    #[test]
    fn members_are_unique() {
        let dir = TempDir::new().unwrap();
        create_team(dir.path(), Team::new("a", "A")).unwrap();
        add_member(dir.path(), "a", "ana").unwrap();
        let t = add_member(dir.path(), "a", "ana").unwrap();
        assert_eq!(t.members, vec!["ana"]);
    }
}
