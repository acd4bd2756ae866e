use crate::cmd::authorize;
use crate::output::{fmt_pct, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use okr_core::{
    access::Action,
    objective::{self, Objective},
    paths, progress,
    state::{log_activity, ActivityKind},
    types::ObjectiveType,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ObjectiveSubcommand {
    /// Add an objective to a cycle
    Add {
        cycle: String,
        statement: String,
        /// strategic | tactical | operational
        #[arg(long = "type", value_name = "TYPE")]
        objective_type: String,
        /// Slug id (derived from the statement if omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// List objectives in a cycle with their progress
    List { cycle: String },
    /// Change an objective's statement
    Update {
        cycle: String,
        id: String,
        #[arg(long)]
        statement: String,
    },
    /// Archive an objective
    Archive { cycle: String, id: String },
    /// Delete an objective with its key results and links
    Remove { cycle: String, id: String },
}

pub fn run(
    root: &Path,
    subcmd: ObjectiveSubcommand,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if let ObjectiveSubcommand::List { cycle } = &subcmd {
        return list(root, cycle, json);
    }
    authorize(root, user, Action::EditObjectives)?;

    let (o, verb) = match subcmd {
        ObjectiveSubcommand::Add {
            cycle,
            statement,
            objective_type,
            id,
        } => {
            let objective_type: ObjectiveType = objective_type.parse()?;
            let existing = objective::load_objectives(root, &cycle)?;
            let id = id.unwrap_or_else(|| {
                objective::unique_id(&existing, &paths::slugify(&statement))
            });
            let o = objective::create_objective(
                root,
                Objective::new(id, statement.trim(), objective_type, cycle.as_str()),
            )
            .with_context(|| format!("failed to add objective to '{cycle}'"))?;
            log_activity(root, ActivityKind::ObjectiveCreated, &o.id, user, o.statement.clone())?;
            (o, "Added")
        }
        ObjectiveSubcommand::Update {
            cycle,
            id,
            statement,
        } => {
            let o = objective::rename_objective(root, &cycle, &id, statement.trim())
                .with_context(|| format!("failed to update objective '{id}'"))?;
            log_activity(root, ActivityKind::ObjectiveUpdated, &id, user, o.statement.clone())?;
            (o, "Updated")
        }
        ObjectiveSubcommand::Archive { cycle, id } => {
            let o = objective::archive_objective(root, &cycle, &id)
                .with_context(|| format!("failed to archive objective '{id}'"))?;
            log_activity(root, ActivityKind::ObjectiveArchived, &id, user, "")?;
            (o, "Archived")
        }
        ObjectiveSubcommand::Remove { cycle, id } => {
            let o = objective::delete_objective(root, &cycle, &id)
                .with_context(|| format!("failed to remove objective '{id}'"))?;
            log_activity(root, ActivityKind::ObjectiveDeleted, &id, user, "")?;
            (o, "Removed")
        }
        ObjectiveSubcommand::List { .. } => return Ok(()),
    };

    if json {
        print_json(&o)
    } else {
        println!("{verb} objective '{}' ({}).", o.id, o.objective_type);
        Ok(())
    }
}

fn list(root: &Path, cycle: &str, json: bool) -> anyhow::Result<()> {
    okr_core::cycle::Cycle::load(root, cycle)
        .with_context(|| format!("failed to load cycle '{cycle}'"))?;
    let objectives = objective::load_objectives(root, cycle)?;

    if json {
        let list: Vec<serde_json::Value> = objectives
            .iter()
            .map(|o| {
                let mut value = serde_json::to_value(o).unwrap_or_default();
                value["average"] = serde_json::json!(progress::objective_average(o));
                value
            })
            .collect();
        return print_json(&list);
    }
    if objectives.is_empty() {
        println!("No objectives in '{cycle}'.");
        return Ok(());
    }

    let mut rows = Vec::new();
    for o in &objectives {
        rows.push(vec![
            o.id.clone(),
            o.objective_type.to_string(),
            o.status.to_string(),
            fmt_pct(progress::objective_average(o)),
            o.statement.clone(),
        ]);
        for kr in &o.key_results {
            rows.push(vec![
                format!("  {}", kr.id),
                kr.ambition.to_string(),
                kr.confidence.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                fmt_pct(progress::key_result_progress(kr)),
                kr.text.clone(),
            ]);
        }
    }
    print_table(&["ID", "TYPE", "STATUS", "PROGRESS", "STATEMENT"], rows);
    Ok(())
}
