use crate::cmd::authorize;
use crate::output::{fmt_pct, print_json};
use anyhow::Context;
use clap::Subcommand;
use okr_core::{
    access::Action,
    objective::{self, KeyResult, KeyResultUpdate, NewKeyResult},
    progress::key_result_progress,
    state::{log_activity, ActivityKind},
    types::{Ambition, Confidence},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum KrSubcommand {
    /// Add a key result to an objective
    Add {
        cycle: String,
        objective: String,
        text: String,
        /// moonshot | roofshot
        #[arg(long, default_value = "roofshot")]
        ambition: String,
        #[arg(long, default_value_t = 0.0)]
        initial: f64,
        /// Current value (defaults to the initial value)
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        metric: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Update fields of a key result
    Update {
        cycle: String,
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        ambition: Option<String>,
        #[arg(long)]
        initial: Option<f64>,
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        target: Option<f64>,
        /// high | medium | low
        #[arg(long)]
        confidence: Option<String>,
        #[arg(long)]
        metric: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Remove a key result (its check-in history is kept)
    Remove { cycle: String, id: String },
}

pub fn run(root: &Path, subcmd: KrSubcommand, user: Option<&str>, json: bool) -> anyhow::Result<()> {
    authorize(root, user, Action::EditObjectives)?;
    match subcmd {
        KrSubcommand::Add {
            cycle,
            objective,
            text,
            ambition,
            initial,
            current,
            target,
            metric,
            unit,
        } => {
            let input = NewKeyResult {
                text,
                metric,
                initial_value: initial,
                current_value: current,
                target_value: target,
                unit,
                ambition: ambition.parse::<Ambition>()?,
                confidence: None,
            };
            let kr = objective::add_key_result(root, &cycle, &objective, input)
                .with_context(|| format!("failed to add key result to '{objective}'"))?;
            log_activity(root, ActivityKind::KeyResultCreated, &kr.id, user, kr.text.clone())?;
            report(&kr, "Added", json)
        }
        KrSubcommand::Update {
            cycle,
            id,
            text,
            ambition,
            initial,
            current,
            target,
            confidence,
            metric,
            unit,
        } => {
            let update = KeyResultUpdate {
                text,
                metric,
                initial_value: initial,
                current_value: current,
                target_value: target,
                unit,
                ambition: ambition.map(|a| a.parse::<Ambition>()).transpose()?,
                confidence: confidence.map(|c| c.parse::<Confidence>()).transpose()?,
            };
            let kr = objective::update_key_result(root, &cycle, &id, update)
                .with_context(|| format!("failed to update key result '{id}'"))?;
            log_activity(root, ActivityKind::KeyResultUpdated, &id, user, "")?;
            report(&kr, "Updated", json)
        }
        KrSubcommand::Remove { cycle, id } => {
            objective::delete_key_result(root, &cycle, &id)
                .with_context(|| format!("failed to remove key result '{id}'"))?;
            log_activity(root, ActivityKind::KeyResultDeleted, &id, user, "")?;
            if json {
                print_json(&serde_json::json!({ "deleted": id }))
            } else {
                println!("Removed key result '{id}'.");
                Ok(())
            }
        }
    }
}

fn report(kr: &KeyResult, verb: &str, json: bool) -> anyhow::Result<()> {
    let progress = key_result_progress(kr);
    if json {
        let mut value = serde_json::to_value(kr)?;
        value["progress"] = serde_json::json!(progress);
        print_json(&value)
    } else {
        println!("{verb} key result '{}' ({}).", kr.id, fmt_pct(progress));
        Ok(())
    }
}
