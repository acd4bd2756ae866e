use crate::error::{OkrError, Result};
use crate::objective::{self, Objective};
use crate::paths;
use crate::progress::key_result_progress;
use crate::state::{log_activity, ActivityKind};
use crate::types::Confidence;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// Checkin
// ---------------------------------------------------------------------------

/// A dated record of one key result's confidence and progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    pub key_result: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    /// Progress snapshot in percent at the time of the check-in.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One key result's contribution to a check-in submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckinEntry {
    pub key_result: String,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub current_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub inserted: Vec<Checkin>,
    /// Key-result ids skipped because a check-in already exists for the date.
    pub skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

pub fn load_checkins(root: &Path, cycle: &str) -> Result<Vec<Checkin>> {
    crate::io::read_yaml_or_default(&paths::checkins_path(root, cycle))
}

pub fn save_checkins(root: &Path, cycle: &str, checkins: &[Checkin]) -> Result<()> {
    if !paths::cycle_manifest(root, cycle).exists() {
        return Err(OkrError::CycleNotFound(cycle.to_string()));
    }
    crate::io::write_yaml(&paths::checkins_path(root, cycle), &checkins)
}

/// Record check-ins for `date`.
///
/// A `(key_result, date)` pair that already exists in the log, or appears
/// twice in the same batch, is skipped without error. Unknown key results
/// fail the whole submission before anything is written.
pub fn submit_checkins(
    root: &Path,
    cycle: &str,
    entries: &[CheckinEntry],
    date: NaiveDate,
    user: Option<&str>,
) -> Result<SubmitOutcome> {
    let mut objectives = objective::load_objectives(root, cycle)?;
    for entry in entries {
        if objective::find_key_result(&objectives, &entry.key_result).is_none() {
            return Err(OkrError::KeyResultNotFound(entry.key_result.clone()));
        }
    }

    let mut checkins = load_checkins(root, cycle)?;
    let previous = checkins.clone();
    let mut taken: HashSet<String> = checkins
        .iter()
        .filter(|c| c.date == date)
        .map(|c| c.key_result.clone())
        .collect();

    let mut outcome = SubmitOutcome::default();
    let now = Utc::now();
    for entry in entries {
        if !taken.insert(entry.key_result.clone()) {
            outcome.skipped.push(entry.key_result.clone());
            continue;
        }
        let kr = objective::find_key_result_mut(&mut objectives, &entry.key_result)?;
        if let Some(v) = entry.current_value {
            kr.current_value = v;
        }
        if let Some(c) = entry.confidence {
            kr.confidence = Some(c);
        }
        kr.updated_at = now;

        let checkin = Checkin {
            id: uuid::Uuid::new_v4().to_string(),
            key_result: entry.key_result.clone(),
            date,
            confidence: entry.confidence,
            progress: key_result_progress(kr),
            user: user.map(str::to_string),
            created_at: now,
        };
        checkins.push(checkin.clone());
        outcome.inserted.push(checkin);
    }

    if outcome.inserted.is_empty() {
        return Ok(outcome);
    }
    commit_submission(root, cycle, &objectives, &checkins, &previous)?;
    log_activity(
        root,
        ActivityKind::CheckinSubmitted,
        cycle,
        user,
        format!("{} on {date}", outcome.inserted.len()),
    )?;
    Ok(outcome)
}

/// Write the check-in log, then the updated key results. If the second write
/// fails the log is put back to `previous`.
fn commit_submission(
    root: &Path,
    cycle: &str,
    objectives: &[Objective],
    checkins: &[Checkin],
    previous: &[Checkin],
) -> Result<()> {
    save_checkins(root, cycle, checkins)?;
    if let Err(e) = objective::save_objectives(root, cycle, objectives) {
        save_checkins(root, cycle, previous)?;
        return Err(e);
    }
    Ok(())
}

/// Check-ins of one key result ordered by date.
pub fn history<'a>(checkins: &'a [Checkin], kr_id: &str) -> Vec<&'a Checkin> {
    let mut rows: Vec<&Checkin> = checkins.iter().filter(|c| c.key_result == kr_id).collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    rows
}

/// The check-in with the greatest date. Among duplicates for that date the
/// most recently created one is returned.
pub fn latest_checkin<'a>(checkins: &'a [Checkin], kr_id: &str) -> Option<&'a Checkin> {
    history(checkins, kr_id).pop()
}

/// Check-in for `kr_id` on exactly `date`.
pub fn checkin_on<'a>(checkins: &'a [Checkin], kr_id: &str, date: NaiveDate) -> Option<&'a Checkin> {
    checkins
        .iter()
        .filter(|c| c.key_result == kr_id && c.date == date)
        .max_by_key(|c| c.created_at)
}

// ---------------------------------------------------------------------------
// Due determination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinDue {
    pub due: bool,
    pub overdue: bool,
    pub last_due_date: Option<NaiveDate>,
}

/// Whether the organization owes a check-in for the schedule as of `today`.
///
/// The latest scheduled date not after `today` is the one that counts; any
/// check-in recorded on exactly that date clears it.
pub fn checkin_due(schedule: &[NaiveDate], checkins: &[Checkin], today: NaiveDate) -> CheckinDue {
    let Some(last) = schedule.iter().copied().filter(|d| *d <= today).max() else {
        return CheckinDue {
            due: false,
            overdue: false,
            last_due_date: None,
        };
    };
    let done = checkins.iter().any(|c| c.date == last);
    CheckinDue {
        due: !done,
        overdue: !done && last != today,
        last_due_date: Some(last),
    }
}

/// Render the reminder text for a due cycle, or `None` when nothing is due.
pub fn reminder_message(cycle_name: &str, due: &CheckinDue, template: &str) -> Option<String> {
    if !due.due {
        return None;
    }
    let date = due.last_due_date.map(|d| d.to_string()).unwrap_or_default();
    Some(template.replace("{cycle}", cycle_name).replace("{date}", &date))
}

/// Key results of the cycle without a check-in on `date`.
pub fn missing_on<'a>(objectives: &'a [Objective], checkins: &[Checkin], date: NaiveDate) -> Vec<&'a str> {
    objectives
        .iter()
        .flat_map(|o| o.key_results.iter())
        .filter(|kr| checkin_on(checkins, &kr.id, date).is_none())
        .map(|kr| kr.id.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::{self, Cycle};
    use crate::objective::NewKeyResult;
    use crate::types::{Ambition, ObjectiveType};
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(kr: &str, date: NaiveDate, confidence: Option<Confidence>) -> Checkin {
        Checkin {
            id: uuid::Uuid::new_v4().to_string(),
            key_result: kr.to_string(),
            date,
            confidence,
            progress: 0.0,
            user: None,
            created_at: Utc::now(),
        }
    }

    fn setup(dir: &TempDir) {
        crate::config::Config::new("acme").save(dir.path()).unwrap();
        crate::state::State::new("acme").save(dir.path()).unwrap();
        cycle::register(dir.path(), Cycle::new("q1", "Q1", "acme"), None).unwrap();
        let mut o = Objective::new("grow", "Grow", ObjectiveType::Strategic, "q1");
        o.add_key_result(NewKeyResult {
            text: "Revenue".into(),
            metric: None,
            initial_value: 0.0,
            current_value: None,
            target_value: 200.0,
            unit: None,
            ambition: Ambition::Roofshot,
            confidence: None,
        });
        objective::create_objective(dir.path(), o).unwrap();
    }

    fn entry(kr: &str, value: Option<f64>, confidence: Option<Confidence>) -> CheckinEntry {
        CheckinEntry {
            key_result: kr.to_string(),
            confidence,
            current_value: value,
        }
    }

    #[test]
    fn due_and_overdue() {
        let schedule = [d(2025, 1, 1), d(2025, 2, 1)];
        let due = checkin_due(&schedule, &[], d(2025, 2, 3));
        assert!(due.due);
        assert!(due.overdue);
        assert_eq!(due.last_due_date, Some(d(2025, 2, 1)));
    }

    #[test]
    fn due_today_is_not_overdue() {
        let schedule = [d(2025, 1, 1), d(2025, 2, 1)];
        let due = checkin_due(&schedule, &[], d(2025, 2, 1));
        assert!(due.due);
        assert!(!due.overdue);
    }

    #[test]
    fn checked_in_clears_due() {
        let schedule = [d(2025, 1, 1), d(2025, 2, 1)];
        let checkins = [record("x-kr1", d(2025, 2, 1), None)];
        let due = checkin_due(&schedule, &checkins, d(2025, 2, 3));
        assert!(!due.due);
        assert!(!due.overdue);
        assert_eq!(due.last_due_date, Some(d(2025, 2, 1)));
    }

    #[test]
    fn nothing_scheduled_yet() {
        let due = checkin_due(&[d(2025, 3, 1)], &[], d(2025, 2, 3));
        assert_eq!(
            due,
            CheckinDue {
                due: false,
                overdue: false,
                last_due_date: None
            }
        );
    }

    #[test]
    fn reminder_only_when_due() {
        let due = checkin_due(&[d(2025, 2, 1)], &[], d(2025, 2, 3));
        let msg = reminder_message("Q1", &due, "Check-in for {cycle} due {date}").unwrap();
        assert_eq!(msg, "Check-in for Q1 due 2025-02-01");

        let clear = checkin_due(&[], &[], d(2025, 2, 3));
        assert!(reminder_message("Q1", &clear, "{cycle}").is_none());
    }

    #[test]
    fn latest_is_max_date() {
        let checkins = [
            record("k", d(2025, 1, 8), Some(Confidence::Low)),
            record("k", d(2025, 1, 1), Some(Confidence::High)),
            record("other", d(2025, 2, 1), None),
        ];
        assert_eq!(latest_checkin(&checkins, "k").unwrap().date, d(2025, 1, 8));
        assert!(latest_checkin(&checkins, "missing").is_none());
        assert_eq!(history(&checkins, "k").len(), 2);
    }

    #[test]
    fn submit_updates_key_result_and_skips_duplicates() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let date = d(2025, 1, 8);

        let out = submit_checkins(
            dir.path(),
            "q1",
            &[
                entry("grow-kr1", Some(50.0), Some(Confidence::Medium)),
                entry("grow-kr1", Some(80.0), None),
            ],
            date,
            Some("ana"),
        )
        .unwrap();
        assert_eq!(out.inserted.len(), 1);
        assert_eq!(out.skipped, vec!["grow-kr1"]);
        assert_eq!(out.inserted[0].progress, 25.0);
        assert_eq!(out.inserted[0].user.as_deref(), Some("ana"));

        let objectives = objective::load_objectives(dir.path(), "q1").unwrap();
        let kr = &objectives[0].key_results[0];
        assert_eq!(kr.current_value, 50.0);
        assert_eq!(kr.confidence, Some(Confidence::Medium));

        let again = submit_checkins(dir.path(), "q1", &[entry("grow-kr1", None, None)], date, None).unwrap();
        assert!(again.inserted.is_empty());
        assert_eq!(load_checkins(dir.path(), "q1").unwrap().len(), 1);
    }

    #[test]
    fn unknown_key_result_writes_nothing() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let err = submit_checkins(
            dir.path(),
            "q1",
            &[entry("grow-kr1", Some(10.0), None), entry("ghost-kr1", None, None)],
            d(2025, 1, 8),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, OkrError::KeyResultNotFound(_)));
        assert!(load_checkins(dir.path(), "q1").unwrap().is_empty());
        let objectives = objective::load_objectives(dir.path(), "q1").unwrap();
        assert_eq!(objectives[0].key_results[0].current_value, 0.0);
    }

    #[test]
    fn checkin_without_confidence_records_none() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        submit_checkins(
            dir.path(),
            "q1",
            &[entry("grow-kr1", Some(20.0), Some(Confidence::High))],
            d(2025, 1, 1),
            None,
        )
        .unwrap();
        let out = submit_checkins(dir.path(), "q1", &[entry("grow-kr1", Some(40.0), None)], d(2025, 1, 8), None)
            .unwrap();
        assert_eq!(out.inserted[0].confidence, None);

        let checkins = load_checkins(dir.path(), "q1").unwrap();
        assert_eq!(checkin_on(&checkins, "grow-kr1", d(2025, 1, 8)).unwrap().confidence, None);
        // The key result keeps its last reported flag.
        let objectives = objective::load_objectives(dir.path(), "q1").unwrap();
        assert_eq!(objectives[0].key_results[0].confidence, Some(Confidence::High));
    }

    #[test]
    fn failed_objectives_write_restores_log() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let previous = vec![record("grow-kr1", d(2025, 1, 1), Some(Confidence::Low))];
        save_checkins(dir.path(), "q1", &previous).unwrap();

        let objectives = objective::load_objectives(dir.path(), "q1").unwrap();
        let mut checkins = previous.clone();
        checkins.push(record("grow-kr1", d(2025, 1, 8), Some(Confidence::High)));

        // A directory in place of objectives.yaml makes the rename fail.
        let objectives_file = paths::objectives_path(dir.path(), "q1");
        std::fs::remove_file(&objectives_file).unwrap();
        std::fs::create_dir(&objectives_file).unwrap();

        assert!(commit_submission(dir.path(), "q1", &objectives, &checkins, &previous).is_err());
        let stored = load_checkins(dir.path(), "q1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, d(2025, 1, 1));
    }

    #[test]
    fn missing_lists_unchecked_key_results() {
        let dir = TempDir::new().unwrap();
        setup(&dir);
        let objectives = objective::load_objectives(dir.path(), "q1").unwrap();
        assert_eq!(missing_on(&objectives, &[], d(2025, 1, 8)), vec!["grow-kr1"]);
        let checkins = [record("grow-kr1", d(2025, 1, 8), None)];
        assert!(missing_on(&objectives, &checkins, d(2025, 1, 8)).is_empty());
    }
}
