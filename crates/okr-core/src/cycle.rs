use crate::error::{OkrError, Result};
use crate::paths;
use crate::state::{ActivityKind, State};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// CycleStatus
// ---------------------------------------------------------------------------

/// Derived lifecycle status. Never persisted: always recomputed from the
/// cycle's dates and the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Draft,
    Active,
    Completed,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleStatus::Draft => "draft",
            CycleStatus::Active => "active",
            CycleStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Resolve a cycle's status for `today`. The end date is inclusive for the
/// whole day. Either date missing yields `Draft`.
pub fn resolve_status(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> CycleStatus {
    let (Some(start), Some(end)) = (start, end) else {
        return CycleStatus::Draft;
    };
    if today < start {
        CycleStatus::Draft
    } else if today > end {
        CycleStatus::Completed
    } else {
        CycleStatus::Active
    }
}

/// Parse an ISO `YYYY-MM-DD` date. A trailing time component is ignored.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| OkrError::InvalidDate(raw.to_string()))
}

/// Manifest dates are read leniently: a hand-edited value that does not
/// parse loads as `None`, so the cycle resolves to `Draft`.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(|s| parse_date(s).ok()))
}

/// Unparseable scheduled dates are dropped.
fn lenient_dates<'de, D>(deserializer: D) -> std::result::Result<Vec<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_yaml::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .iter()
        .filter_map(|v| v.as_str())
        .filter_map(|s| parse_date(s).ok())
        .collect())
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub slug: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub organization: String,
    /// Scheduled check-in dates, sorted and unique.
    #[serde(default, deserialize_with = "lenient_dates")]
    pub checkin_dates: Vec<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cycle {
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            name: name.into(),
            start_date: None,
            end_date: None,
            theme: None,
            organization: organization.into(),
            checkin_dates: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self, today: NaiveDate) -> CycleStatus {
        resolve_status(self.start_date, self.end_date, today)
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Persist a new cycle. Fails if the slug is taken or the dates are inverted.
    pub fn create(root: &Path, cycle: Cycle) -> Result<Self> {
        paths::validate_slug(&cycle.slug)?;
        cycle.check_range()?;
        if paths::cycle_dir(root, &cycle.slug).exists() {
            return Err(OkrError::CycleExists(cycle.slug));
        }
        let mut cycle = cycle;
        cycle.normalize_schedule();
        cycle.save(root)?;
        Ok(cycle)
    }

    pub fn load(root: &Path, slug: &str) -> Result<Self> {
        let manifest = paths::cycle_manifest(root, slug);
        if !manifest.exists() {
            return Err(OkrError::CycleNotFound(slug.to_string()));
        }
        let data = std::fs::read_to_string(&manifest)?;
        let cycle: Cycle = serde_yaml::from_str(&data)?;
        Ok(cycle)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::cycle_manifest(root, &self.slug), self)
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let cycles_dir = root.join(paths::CYCLES_DIR);
        if !cycles_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cycles = Vec::new();
        for entry in std::fs::read_dir(&cycles_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let slug = entry.file_name().to_string_lossy().into_owned();
                match Self::load(root, &slug) {
                    Ok(c) => cycles.push(c),
                    Err(OkrError::CycleNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        cycles.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(cycles)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn set_dates(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        let previous = (self.start_date, self.end_date);
        self.start_date = start;
        self.end_date = end;
        if let Err(e) = self.check_range() {
            (self.start_date, self.end_date) = previous;
            return Err(e);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn set_theme(&mut self, theme: Option<String>) {
        self.theme = theme.filter(|t| !t.trim().is_empty());
        self.updated_at = Utc::now();
    }

    /// Add scheduled check-in dates. Returns how many were new.
    pub fn schedule_checkins(&mut self, dates: &[NaiveDate]) -> usize {
        let before = self.checkin_dates.len();
        self.checkin_dates.extend_from_slice(dates);
        self.normalize_schedule();
        let added = self.checkin_dates.len() - before;
        if added > 0 {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove a scheduled date. Returns `false` if it was not scheduled.
    pub fn unschedule_checkin(&mut self, date: NaiveDate) -> bool {
        let before = self.checkin_dates.len();
        self.checkin_dates.retain(|d| *d != date);
        if self.checkin_dates.len() < before {
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }

    fn normalize_schedule(&mut self) {
        self.checkin_dates.sort();
        self.checkin_dates.dedup();
    }

    fn check_range(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(OkrError::InvalidCycleRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Create a cycle and register it in the organization state.
///
/// The manifest (including the check-in schedule) is one write; registering in
/// `state.yaml` is a second. If the second fails the cycle directory is
/// removed again so no unregistered cycle is left behind.
pub fn register(root: &Path, cycle: Cycle, user: Option<&str>) -> Result<Cycle> {
    let mut state = State::load(root)?;
    let cycle = Cycle::create(root, cycle)?;

    state.add_cycle(&cycle.slug);
    state.record(ActivityKind::CycleCreated, &cycle.slug, user, cycle.name.clone());
    if let Err(e) = state.save(root) {
        crate::io::remove_dir_if_exists(&paths::cycle_dir(root, &cycle.slug))?;
        return Err(e);
    }
    Ok(cycle)
}

/// Delete a cycle and everything it owns: objectives, key results, links,
/// check-ins, and team assignments of its key results.
pub fn delete(root: &Path, slug: &str, user: Option<&str>) -> Result<()> {
    if !paths::cycle_manifest(root, slug).exists() {
        return Err(OkrError::CycleNotFound(slug.to_string()));
    }
    let objectives = crate::objective::load_objectives(root, slug)?;
    let kr_ids: Vec<String> = objectives
        .iter()
        .flat_map(|o| o.key_results.iter().map(|kr| kr.id.clone()))
        .collect();
    crate::team::unassign_everywhere(root, &kr_ids)?;
    crate::io::remove_dir_if_exists(&paths::cycle_dir(root, slug))?;

    let mut state = State::load(root)?;
    state.remove_cycle(slug);
    state.record(ActivityKind::CycleDeleted, slug, user, "");
    state.save(root)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup(dir: &TempDir) {
        crate::config::Config::new("acme").save(dir.path()).unwrap();
        State::new("acme").save(dir.path()).unwrap();
    }

    #[test]
    fn status_boundaries() {
        let start = d(2025, 1, 1);
        let end = d(2025, 3, 31);
        let s = Some(start);
        let e = Some(end);
        assert_eq!(resolve_status(s, e, start), CycleStatus::Active);
        assert_eq!(resolve_status(s, e, end), CycleStatus::Active);
        assert_eq!(resolve_status(s, e, end + Duration::days(1)), CycleStatus::Completed);
        assert_eq!(resolve_status(s, e, start - Duration::days(1)), CycleStatus::Draft);
    }

    #[test]
    fn missing_dates_are_draft() {
        let today = d(2025, 2, 1);
        assert_eq!(resolve_status(None, Some(today), today), CycleStatus::Draft);
        assert_eq!(resolve_status(Some(today), None, today), CycleStatus::Draft);
    }

    #[test]
    fn hand_edited_bad_dates_load_as_draft() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let manifest = paths::cycle_manifest(dir.path(), "q1");
        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(
            &manifest,
            "slug: q1\nname: Q1\nstart_date: 'abril'\nend_date: 2025-12-31T23:59:59Z\n\
             organization: acme\ncheckin_dates:\n- 2025-02-01\n- soon\n\
             created_at: 2025-01-01T00:00:00Z\nupdated_at: 2025-01-01T00:00:00Z\n",
        )
        .unwrap();

        let c = Cycle::load(dir.path(), "q1").unwrap();
        assert_eq!(c.start_date, None);
        assert_eq!(c.end_date, Some(d(2025, 12, 31)));
        assert_eq!(c.checkin_dates, vec![d(2025, 2, 1)]);
        assert_eq!(c.status(d(2025, 6, 1)), CycleStatus::Draft);
        assert_eq!(Cycle::list(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn create_load_and_list() {
        let dir = TempDir::new().unwrap();
        setup(&dir);

        let mut c = Cycle::new("q1-2025", "Q1 2025", "acme");
        c.start_date = Some(d(2025, 1, 1));
        c.end_date = Some(d(2025, 3, 31));
        c.checkin_dates = vec![d(2025, 2, 1), d(2025, 1, 15), d(2025, 2, 1)];
        let created = register(dir.path(), c, Some("ana")).unwrap();
        assert_eq!(created.checkin_dates, vec![d(2025, 1, 15), d(2025, 2, 1)]);

        let loaded = Cycle::load(dir.path(), "q1-2025").unwrap();
        assert_eq!(loaded.name, "Q1 2025");
        assert_eq!(loaded.status(d(2025, 2, 10)), CycleStatus::Active);

        let state = State::load(dir.path()).unwrap();
        assert_eq!(state.cycles, vec!["q1-2025"]);
        assert_eq!(Cycle::list(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_cycle_fails() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        register(dir.path(), Cycle::new("q1", "Q1", "acme"), None).unwrap();
        assert!(matches!(
            register(dir.path(), Cycle::new("q1", "again", "acme"), None),
            Err(OkrError::CycleExists(_))
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let mut c = Cycle::new("q1", "Q1", "acme");
        c.start_date = Some(d(2025, 3, 1));
        c.end_date = Some(d(2025, 1, 1));
        assert!(matches!(
            register(dir.path(), c, None),
            Err(OkrError::InvalidCycleRange { .. })
        ));

        let mut ok = Cycle::new("q2", "Q2", "acme");
        ok.set_dates(Some(d(2025, 4, 1)), Some(d(2025, 6, 30))).unwrap();
        assert!(ok.set_dates(Some(d(2025, 7, 1)), Some(d(2025, 6, 30))).is_err());
        assert_eq!(ok.start_date, Some(d(2025, 4, 1)));
    }

    #[test]
    fn schedule_dedups() {
        let mut c = Cycle::new("q1", "Q1", "acme");
        assert_eq!(c.schedule_checkins(&[d(2025, 1, 8), d(2025, 1, 1)]), 2);
        assert_eq!(c.schedule_checkins(&[d(2025, 1, 8)]), 0);
        assert_eq!(c.checkin_dates, vec![d(2025, 1, 1), d(2025, 1, 8)]);
        assert!(c.unschedule_checkin(d(2025, 1, 1)));
        assert!(!c.unschedule_checkin(d(2025, 1, 1)));
    }

    #[test]
    fn delete_removes_directory_and_registration() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        register(dir.path(), Cycle::new("q1", "Q1", "acme"), None).unwrap();
        delete(dir.path(), "q1", None).unwrap();
        assert!(!paths::cycle_dir(dir.path(), "q1").exists());
        assert!(State::load(dir.path()).unwrap().cycles.is_empty());
        assert!(matches!(
            delete(dir.path(), "q1", None),
            Err(OkrError::CycleNotFound(_))
        ));
    }

    #[test]
    fn parse_date_accepts_timestamps() {
        assert_eq!(parse_date("2025-02-03").unwrap(), d(2025, 2, 3));
        assert_eq!(parse_date("2025-02-03T10:00:00Z").unwrap(), d(2025, 2, 3));
        assert!(matches!(parse_date("03/02/2025"), Err(OkrError::InvalidDate(_))));
    }
}
