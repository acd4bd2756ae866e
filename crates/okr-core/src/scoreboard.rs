//! Key result × check-in date confidence matrix.

use crate::checkin::{checkin_on, Checkin};
use crate::objective::Objective;
use crate::progress::key_result_progress;
use crate::types::{Confidence, ObjectiveType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCell {
    pub date: NaiveDate,
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    pub key_result_id: String,
    pub kr_text: String,
    pub objective_id: String,
    pub objective_type: ObjectiveType,
    pub progress: f64,
    pub cells: Vec<ScoreCell>,
}

impl ScoreRow {
    pub fn confidences(&self) -> Vec<Option<Confidence>> {
        self.cells.iter().map(|c| c.confidence).collect()
    }
}

/// One row per key result, grouped strategic, tactical, operational and in
/// objective order within a group. A cell holds the confidence of the
/// check-in dated exactly on that column; earlier values never carry forward.
pub fn build_scoreboard(
    objectives: &[Objective],
    checkins: &[Checkin],
    dates: &[NaiveDate],
) -> Vec<ScoreRow> {
    let mut rows = Vec::new();
    for &t in ObjectiveType::all() {
        for o in objectives.iter().filter(|o| o.objective_type == t) {
            for kr in &o.key_results {
                let cells = dates
                    .iter()
                    .map(|&date| ScoreCell {
                        date,
                        confidence: checkin_on(checkins, &kr.id, date).and_then(|c| c.confidence),
                    })
                    .collect();
                rows.push(ScoreRow {
                    key_result_id: kr.id.clone(),
                    kr_text: kr.text.clone(),
                    objective_id: o.id.clone(),
                    objective_type: t,
                    progress: key_result_progress(kr),
                    cells,
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::NewKeyResult;
    use crate::types::Ambition;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn objective(id: &str, t: ObjectiveType) -> Objective {
        let mut o = Objective::new(id, id, t, "q1");
        o.add_key_result(NewKeyResult {
            text: format!("{id} kr"),
            metric: None,
            initial_value: 0.0,
            current_value: Some(30.0),
            target_value: 100.0,
            unit: None,
            ambition: Ambition::Roofshot,
            confidence: None,
        });
        o
    }

    fn checkin(kr: &str, date: NaiveDate, confidence: Confidence) -> Checkin {
        Checkin {
            id: format!("{kr}-{date}"),
            key_result: kr.to_string(),
            date,
            confidence: Some(confidence),
            progress: 0.0,
            user: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn exact_date_cells_without_carry_forward() {
        let objectives = vec![objective("k", ObjectiveType::Strategic)];
        let checkins = vec![
            checkin("k-kr1", d(2025, 1, 1), Confidence::High),
            checkin("k-kr1", d(2025, 1, 8), Confidence::Low),
        ];
        let dates = [d(2025, 1, 1), d(2025, 1, 5), d(2025, 1, 8)];
        let rows = build_scoreboard(&objectives, &checkins, &dates);

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].confidences(),
            vec![Some(Confidence::High), None, Some(Confidence::Low)]
        );
        assert_eq!(rows[0].progress, 30.0);
    }

    #[test]
    fn rows_grouped_by_type() {
        let objectives = vec![
            objective("op", ObjectiveType::Operational),
            objective("st", ObjectiveType::Strategic),
            objective("ta", ObjectiveType::Tactical),
        ];
        let rows = build_scoreboard(&objectives, &[], &[d(2025, 1, 1)]);
        let order: Vec<ObjectiveType> = rows.iter().map(|r| r.objective_type).collect();
        assert_eq!(
            order,
            vec![
                ObjectiveType::Strategic,
                ObjectiveType::Tactical,
                ObjectiveType::Operational
            ]
        );
        assert!(rows.iter().all(|r| r.cells[0].confidence.is_none()));
    }

    #[test]
    fn no_dates_no_cells() {
        let rows = build_scoreboard(&[objective("k", ObjectiveType::Tactical)], &[], &[]);
        assert!(rows[0].cells.is_empty());
    }
}
