//! Progress aggregation over already-loaded objectives.
//!
//! Every function here returns `0.0` for empty input and never NaN.
//! `type_average` is a mean of per-objective means while `ambition_average`
//! is a flat mean over key results; both conventions are kept on purpose
//! because different dashboard widgets report them.

use crate::objective::{KeyResult, Objective};
use crate::types::{Ambition, ObjectiveType};
use serde::{Deserialize, Serialize};

/// Progress of a key result in whole percent, clamped to `[0, 100]`.
/// A key result whose target equals its initial value reports 0.
pub fn key_result_progress(kr: &KeyResult) -> f64 {
    let span = kr.target_value - kr.initial_value;
    if span == 0.0 {
        return 0.0;
    }
    let raw = ((kr.current_value - kr.initial_value) / span * 100.0).round();
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mean key-result progress of one objective.
pub fn objective_average(objective: &Objective) -> f64 {
    mean(objective.key_results.iter().map(key_result_progress))
}

fn in_cycle<'a>(cycle: &'a str, objectives: &'a [Objective]) -> impl Iterator<Item = &'a Objective> {
    objectives.iter().filter(move |o| o.cycle == cycle)
}

/// Flat mean over every key result of every objective in the cycle.
pub fn cycle_average(cycle: &str, objectives: &[Objective]) -> f64 {
    mean(
        in_cycle(cycle, objectives)
            .flat_map(|o| o.key_results.iter())
            .map(key_result_progress),
    )
}

/// Mean of [`objective_average`] over the cycle's objectives of one type.
pub fn type_average(cycle: &str, objective_type: ObjectiveType, objectives: &[Objective]) -> f64 {
    mean(
        in_cycle(cycle, objectives)
            .filter(|o| o.objective_type == objective_type)
            .map(objective_average),
    )
}

/// Flat mean over the cycle's key results of one ambition class.
pub fn ambition_average(cycle: &str, ambition: Ambition, objectives: &[Objective]) -> f64 {
    mean(
        in_cycle(cycle, objectives)
            .flat_map(|o| o.key_results.iter())
            .filter(|kr| kr.ambition == ambition)
            .map(key_result_progress),
    )
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAverage {
    pub objective_type: ObjectiveType,
    pub average: f64,
    pub objectives: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbitionAverage {
    pub ambition: Ambition,
    pub average: f64,
    pub key_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub id: String,
    pub statement: String,
    pub objective_type: ObjectiveType,
    pub average: f64,
    pub key_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleDashboard {
    pub cycle: String,
    pub average: f64,
    pub objective_count: usize,
    pub key_result_count: usize,
    pub by_type: Vec<TypeAverage>,
    pub by_ambition: Vec<AmbitionAverage>,
    pub objectives: Vec<ObjectiveProgress>,
}

/// Every aggregate the cycle dashboard shows, computed in one pass per widget.
pub fn cycle_dashboard(cycle: &str, objectives: &[Objective]) -> CycleDashboard {
    let scoped: Vec<&Objective> = in_cycle(cycle, objectives).collect();

    let by_type = ObjectiveType::all()
        .iter()
        .map(|&t| TypeAverage {
            objective_type: t,
            average: type_average(cycle, t, objectives),
            objectives: scoped.iter().filter(|o| o.objective_type == t).count(),
        })
        .collect();

    let by_ambition = Ambition::all()
        .iter()
        .map(|&a| AmbitionAverage {
            ambition: a,
            average: ambition_average(cycle, a, objectives),
            key_results: scoped
                .iter()
                .flat_map(|o| o.key_results.iter())
                .filter(|kr| kr.ambition == a)
                .count(),
        })
        .collect();

    CycleDashboard {
        cycle: cycle.to_string(),
        average: cycle_average(cycle, objectives),
        objective_count: scoped.len(),
        key_result_count: scoped.iter().map(|o| o.key_results.len()).sum(),
        by_type,
        by_ambition,
        objectives: scoped
            .iter()
            .map(|o| ObjectiveProgress {
                id: o.id.clone(),
                statement: o.statement.clone(),
                objective_type: o.objective_type,
                average: objective_average(o),
                key_results: o.key_results.len(),
            })
            .collect(),
    }
}
