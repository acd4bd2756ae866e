use crate::error::{OkrError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const HISTORY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CycleCreated,
    CycleUpdated,
    CycleDeleted,
    ObjectiveCreated,
    ObjectiveUpdated,
    ObjectiveArchived,
    ObjectiveDeleted,
    KeyResultCreated,
    KeyResultUpdated,
    KeyResultDeleted,
    LinkCreated,
    LinkDeleted,
    CheckinSubmitted,
    DraftImported,
    TeamUpdated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    /// Slug or id of the affected record.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "default_version")]
    pub version: u32,
    pub organization: String,
    #[serde(default)]
    pub cycles: Vec<String>,
    #[serde(default)]
    pub history: Vec<ActivityEntry>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl State {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            version: 1,
            organization: organization.into(),
            cycles: Vec::new(),
            history: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Err(OkrError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let state: State = serde_yaml::from_str(&data)?;
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::state_path(root), self)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn add_cycle(&mut self, slug: &str) {
        if !self.cycles.iter().any(|c| c == slug) {
            self.cycles.push(slug.to_string());
        }
        self.last_updated = Utc::now();
    }

    pub fn remove_cycle(&mut self, slug: &str) {
        self.cycles.retain(|c| c != slug);
        self.last_updated = Utc::now();
    }

    pub fn record(
        &mut self,
        kind: ActivityKind,
        subject: &str,
        user: Option<&str>,
        detail: impl Into<String>,
    ) {
        self.history.push(ActivityEntry {
            kind,
            subject: subject.to_string(),
            user: user.map(str::to_string),
            detail: detail.into(),
            timestamp: Utc::now(),
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.drain(..self.history.len() - HISTORY_LIMIT);
        }
        self.last_updated = Utc::now();
    }

    pub fn last_activity(&self) -> Option<&ActivityEntry> {
        self.history.last()
    }
}

/// Append one activity entry to the persisted state.
pub fn log_activity(
    root: &Path,
    kind: ActivityKind,
    subject: &str,
    user: Option<&str>,
    detail: impl Into<String>,
) -> Result<()> {
    let mut state = State::load(root)?;
    state.record(kind, subject, user, detail);
    state.save(root)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
