use crate::error::{OkrError, Result};
use crate::paths;
use crate::types::{Ambition, Confidence, ObjectiveType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// ObjectiveStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Draft,
    Active,
    Archived,
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectiveStatus::Draft => "draft",
            ObjectiveStatus::Active => "active",
            ObjectiveStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// KeyResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default)]
    pub initial_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub ambition: Ambition,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Objective::add_key_result`]. `current` defaults to `initial`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKeyResult {
    pub text: String,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub initial_value: f64,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub ambition: Ambition,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// Partial update of a key result; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyResultUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub initial_value: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub ambition: Option<Ambition>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

impl KeyResult {
    pub fn apply(&mut self, update: KeyResultUpdate) {
        if let Some(text) = update.text {
            self.text = text;
        }
        if let Some(metric) = update.metric {
            self.metric = Some(metric);
        }
        if let Some(v) = update.initial_value {
            self.initial_value = v;
        }
        if let Some(v) = update.current_value {
            self.current_value = v;
        }
        if let Some(v) = update.target_value {
            self.target_value = v;
        }
        if let Some(unit) = update.unit {
            self.unit = Some(unit);
        }
        if let Some(a) = update.ambition {
            self.ambition = a;
        }
        if let Some(c) = update.confidence {
            self.confidence = Some(c);
        }
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub statement: String,
    #[serde(rename = "type")]
    pub objective_type: ObjectiveType,
    pub status: ObjectiveStatus,
    pub cycle: String,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    /// Sequence used to mint key-result ids; never reused after removal.
    #[serde(default)]
    pub kr_seq: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Objective {
    pub fn new(
        id: impl Into<String>,
        statement: impl Into<String>,
        objective_type: ObjectiveType,
        cycle: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            statement: statement.into(),
            objective_type,
            status: ObjectiveStatus::Draft,
            cycle: cycle.into(),
            key_results: Vec::new(),
            kr_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a key result. A draft objective becomes active once it has one.
    pub fn add_key_result(&mut self, input: NewKeyResult) -> &KeyResult {
        self.kr_seq += 1;
        let now = Utc::now();
        self.key_results.push(KeyResult {
            id: format!("{}-kr{}", self.id, self.kr_seq),
            text: input.text,
            metric: input.metric,
            initial_value: input.initial_value,
            current_value: input.current_value.unwrap_or(input.initial_value),
            target_value: input.target_value,
            unit: input.unit,
            ambition: input.ambition,
            confidence: input.confidence,
            created_at: now,
            updated_at: now,
        });
        if self.status == ObjectiveStatus::Draft {
            self.status = ObjectiveStatus::Active;
        }
        self.updated_at = now;
        &self.key_results[self.key_results.len() - 1]
    }

    pub fn key_result(&self, id: &str) -> Option<&KeyResult> {
        self.key_results.iter().find(|kr| kr.id == id)
    }

    pub fn key_result_mut(&mut self, id: &str) -> Option<&mut KeyResult> {
        self.key_results.iter_mut().find(|kr| kr.id == id)
    }

    /// Remove a key result. Returns `false` if not present.
    pub fn remove_key_result(&mut self, id: &str) -> bool {
        let before = self.key_results.len();
        self.key_results.retain(|kr| kr.id != id);
        if self.key_results.len() < before {
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }

    pub fn set_statement(&mut self, statement: impl Into<String>) {
        self.statement = statement.into();
        self.updated_at = Utc::now();
    }

    pub fn archive(&mut self) {
        self.status = ObjectiveStatus::Archived;
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Persistence (one file per cycle)
// ---------------------------------------------------------------------------

pub fn load_objectives(root: &Path, cycle: &str) -> Result<Vec<Objective>> {
    crate::io::read_yaml_or_default(&paths::objectives_path(root, cycle))
}

pub fn save_objectives(root: &Path, cycle: &str, objectives: &[Objective]) -> Result<()> {
    if !paths::cycle_manifest(root, cycle).exists() {
        return Err(OkrError::CycleNotFound(cycle.to_string()));
    }
    crate::io::write_yaml(&paths::objectives_path(root, cycle), &objectives)
}

/// Load objectives from every cycle of the organization.
pub fn load_all(root: &Path) -> Result<Vec<Objective>> {
    let mut all = Vec::new();
    for cycle in crate::cycle::Cycle::list(root)? {
        all.extend(load_objectives(root, &cycle.slug)?);
    }
    Ok(all)
}

/// Persist a new objective in its cycle.
pub fn create_objective(root: &Path, objective: Objective) -> Result<Objective> {
    paths::validate_slug(&objective.id)?;
    if !paths::cycle_manifest(root, &objective.cycle).exists() {
        return Err(OkrError::CycleNotFound(objective.cycle.clone()));
    }
    let mut objectives = load_objectives(root, &objective.cycle)?;
    if objectives.iter().any(|o| o.id == objective.id) {
        return Err(OkrError::ObjectiveExists(objective.id));
    }
    objectives.push(objective.clone());
    save_objectives(root, &objective.cycle, &objectives)?;
    Ok(objective)
}

pub fn find<'a>(objectives: &'a [Objective], id: &str) -> Result<&'a Objective> {
    objectives
        .iter()
        .find(|o| o.id == id)
        .ok_or_else(|| OkrError::ObjectiveNotFound(id.to_string()))
}

pub fn find_mut<'a>(objectives: &'a mut [Objective], id: &str) -> Result<&'a mut Objective> {
    objectives
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| OkrError::ObjectiveNotFound(id.to_string()))
}

/// Locate a key result and its owning objective.
pub fn find_key_result<'a>(
    objectives: &'a [Objective],
    kr_id: &str,
) -> Option<(&'a Objective, &'a KeyResult)> {
    objectives
        .iter()
        .find_map(|o| o.key_result(kr_id).map(|kr| (o, kr)))
}

pub fn find_key_result_mut<'a>(
    objectives: &'a mut [Objective],
    kr_id: &str,
) -> Result<&'a mut KeyResult> {
    objectives
        .iter_mut()
        .find_map(|o| o.key_result_mut(kr_id))
        .ok_or_else(|| OkrError::KeyResultNotFound(kr_id.to_string()))
}

/// Delete an objective along with its key results, the links touching it and
/// the team assignments of its key results.
pub fn delete_objective(root: &Path, cycle: &str, id: &str) -> Result<Objective> {
    let mut objectives = load_objectives(root, cycle)?;
    let pos = objectives
        .iter()
        .position(|o| o.id == id)
        .ok_or_else(|| OkrError::ObjectiveNotFound(id.to_string()))?;
    let removed = objectives.remove(pos);
    save_objectives(root, cycle, &objectives)?;

    crate::link::remove_links_touching(root, cycle, id)?;
    let kr_ids: Vec<String> = removed.key_results.iter().map(|kr| kr.id.clone()).collect();
    crate::team::unassign_everywhere(root, &kr_ids)?;
    Ok(removed)
}

/// Add a key result to a stored objective.
pub fn add_key_result(
    root: &Path,
    cycle: &str,
    objective_id: &str,
    input: NewKeyResult,
) -> Result<KeyResult> {
    let mut objectives = load_objectives(root, cycle)?;
    let kr = find_mut(&mut objectives, objective_id)?
        .add_key_result(input)
        .clone();
    save_objectives(root, cycle, &objectives)?;
    Ok(kr)
}

/// Apply a partial update to a stored key result.
pub fn update_key_result(
    root: &Path,
    cycle: &str,
    kr_id: &str,
    update: KeyResultUpdate,
) -> Result<KeyResult> {
    let mut objectives = load_objectives(root, cycle)?;
    let kr = find_key_result_mut(&mut objectives, kr_id)?;
    kr.apply(update);
    let kr = kr.clone();
    save_objectives(root, cycle, &objectives)?;
    Ok(kr)
}

/// Remove a stored key result and its team assignments. Its check-in history
/// is kept.
pub fn delete_key_result(root: &Path, cycle: &str, kr_id: &str) -> Result<()> {
    let mut objectives = load_objectives(root, cycle)?;
    let owner = objectives
        .iter_mut()
        .find(|o| o.key_result(kr_id).is_some())
        .ok_or_else(|| OkrError::KeyResultNotFound(kr_id.to_string()))?;
    owner.remove_key_result(kr_id);
    save_objectives(root, cycle, &objectives)?;
    crate::team::unassign_everywhere(root, &[kr_id.to_string()])?;
    Ok(())
}

/// Change the statement of a stored objective.
pub fn rename_objective(root: &Path, cycle: &str, id: &str, statement: &str) -> Result<Objective> {
    let mut objectives = load_objectives(root, cycle)?;
    let o = find_mut(&mut objectives, id)?;
    o.set_statement(statement);
    let o = o.clone();
    save_objectives(root, cycle, &objectives)?;
    Ok(o)
}

pub fn archive_objective(root: &Path, cycle: &str, id: &str) -> Result<Objective> {
    let mut objectives = load_objectives(root, cycle)?;
    let o = find_mut(&mut objectives, id)?;
    o.archive();
    let o = o.clone();
    save_objectives(root, cycle, &objectives)?;
    Ok(o)
}

/// Pick an id based on `base` that is not used by any of `existing`.
pub fn unique_id(existing: &[Objective], base: &str) -> String {
    let taken = |candidate: &str| existing.iter().any(|o| o.id == candidate);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|c| !taken(c))
        .unwrap_or_else(|| base.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::{self, Cycle};
    use tempfile::TempDir;

    fn setup(dir: &TempDir) {
        crate::config::Config::new("acme").save(dir.path()).unwrap();
        crate::state::State::new("acme").save(dir.path()).unwrap();
        cycle::register(dir.path(), Cycle::new("q1", "Q1", "acme"), None).unwrap();
    }

    fn kr(text: &str) -> NewKeyResult {
        NewKeyResult {
            text: text.to_string(),
            metric: None,
            initial_value: 0.0,
            current_value: None,
            target_value: 100.0,
            unit: Some("%".into()),
            ambition: Ambition::Roofshot,
            confidence: None,
        }
    }

    #[test]
    fn adding_key_result_activates_objective() {
        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        assert_eq!(o.status, ObjectiveStatus::Draft);
        let id = o.add_key_result(kr("Double revenue")).id.clone();
        assert_eq!(id, "grow-kr1");
        assert_eq!(o.status, ObjectiveStatus::Active);
        assert_eq!(o.key_results[0].current_value, 0.0);
    }

    #[test]
    fn key_result_ids_are_not_reused() {
        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        o.add_key_result(kr("a"));
        o.add_key_result(kr("b"));
        assert!(o.remove_key_result("grow-kr2"));
        assert!(!o.remove_key_result("grow-kr2"));
        assert_eq!(o.add_key_result(kr("c")).id, "grow-kr3");
    }

    #[test]
    fn archived_objective_stays_archived() {
        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        o.archive();
        o.add_key_result(kr("a"));
        assert_eq!(o.status, ObjectiveStatus::Archived);
    }

    #[test]
    fn create_and_reload() {
        let dir = TempDir::new().unwrap();
        setup(&dir);

        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        o.add_key_result(kr("Double revenue"));
        create_objective(dir.path(), o).unwrap();

        let loaded = load_objectives(dir.path(), "q1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].objective_type, ObjectiveType::Strategic);
        let (owner, found) = find_key_result(&loaded, "grow-kr1").unwrap();
        assert_eq!(owner.id, "grow");
        assert_eq!(found.text, "Double revenue");
    }

    #[test]
    fn create_rejects_duplicates_and_unknown_cycle() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        create_objective(dir.path(), o.clone()).unwrap();
        assert!(matches!(
            create_objective(dir.path(), o),
            Err(OkrError::ObjectiveExists(_))
        ));
        let orphan = Objective::new("x", "X", ObjectiveType::Tactical, "nope");
        assert!(matches!(
            create_objective(dir.path(), orphan),
            Err(OkrError::CycleNotFound(_))
        ));
    }

    #[test]
    fn key_result_update_is_partial() {
        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        o.add_key_result(kr("a"));
        let k = o.key_result_mut("grow-kr1").unwrap();
        k.apply(KeyResultUpdate {
            current_value: Some(40.0),
            confidence: Some(Confidence::Low),
            ..Default::default()
        });
        assert_eq!(k.current_value, 40.0);
        assert_eq!(k.target_value, 100.0);
        assert_eq!(k.confidence, Some(Confidence::Low));
    }

    #[test]
    fn unique_id_appends_counter() {
        let existing = vec![
            Objective::new("grow", "", ObjectiveType::Strategic, "q1"),
            Objective::new("grow-2", "", ObjectiveType::Strategic, "q1"),
        ];
        assert_eq!(unique_id(&existing, "grow"), "grow-3");
        assert_eq!(unique_id(&existing, "hire"), "hire");
    }

    #[test]
    fn yaml_uses_type_key() {
        let o = Objective::new("grow", "Grow", ObjectiveType::Tactical, "q1");
        let yaml = serde_yaml::to_string(&o).unwrap();
        assert!(yaml.contains("type: tactical"));
    }

    #[test]
    fn stored_key_result_lifecycle() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        create_objective(dir.path(), Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1"))
            .unwrap();

        let added = add_key_result(dir.path(), "q1", "grow", kr("Revenue")).unwrap();
        assert_eq!(added.id, "grow-kr1");
        let loaded = load_objectives(dir.path(), "q1").unwrap();
        assert_eq!(loaded[0].status, ObjectiveStatus::Active);

        let updated = update_key_result(
            dir.path(),
            "q1",
            "grow-kr1",
            KeyResultUpdate {
                current_value: Some(25.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.current_value, 25.0);

        crate::team::create_team(dir.path(), crate::team::Team::new("sales", "Sales")).unwrap();
        crate::team::assign(dir.path(), "sales", "grow-kr1").unwrap();
        delete_key_result(dir.path(), "q1", "grow-kr1").unwrap();
        assert!(load_objectives(dir.path(), "q1").unwrap()[0].key_results.is_empty());
        assert!(crate::team::load_team(dir.path(), "sales").unwrap().key_results.is_empty());
        assert!(matches!(
            delete_key_result(dir.path(), "q1", "grow-kr1"),
            Err(OkrError::KeyResultNotFound(_))
        ));
    }

    #[test]
    fn delete_objective_cascades() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let mut s = Objective::new("s1", "S", ObjectiveType::Strategic, "q1");
        s.add_key_result(kr("a"));
        create_objective(dir.path(), s).unwrap();
        create_objective(dir.path(), Objective::new("t1", "T", ObjectiveType::Tactical, "q1")).unwrap();
        crate::link::add_link(
            dir.path(),
            "q1",
            "t1",
            "s1",
            crate::link::LinkConvention::ChildToParent,
        )
        .unwrap();
        crate::team::create_team(dir.path(), crate::team::Team::new("ops", "Ops")).unwrap();
        crate::team::assign(dir.path(), "ops", "s1-kr1").unwrap();

        let removed = delete_objective(dir.path(), "q1", "s1").unwrap();
        assert_eq!(removed.key_results.len(), 1);
        assert!(crate::link::load_links(dir.path(), "q1").unwrap().is_empty());
        assert!(crate::team::load_team(dir.path(), "ops").unwrap().key_results.is_empty());

        let archived = archive_objective(dir.path(), "q1", "t1").unwrap();
        assert_eq!(archived.status, ObjectiveStatus::Archived);
        let renamed = rename_objective(dir.path(), "q1", "t1", "Tactics").unwrap();
        assert_eq!(renamed.statement, "Tactics");
    }
}
