use crate::cmd::authorize;
use crate::output::{print_json, print_table};
use anyhow::{bail, Context};
use clap::Subcommand;
use okr_core::{
    access::Action,
    objective,
    state::{log_activity, ActivityKind},
    team::{self, Team},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// Create a team
    Create {
        slug: String,
        #[arg(long)]
        name: String,
        /// Member name (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// List teams and their key results
    List,
    /// Assign a key result to a team
    Assign { team: String, key_result: String },
    /// Remove a key result from a team
    Unassign { team: String, key_result: String },
}

pub fn run(root: &Path, subcmd: TeamSubcommand, user: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (t, message) = match subcmd {
        TeamSubcommand::List => return list(root, json),
        TeamSubcommand::Create {
            slug,
            name,
            members,
        } => {
            authorize(root, user, Action::ManageTeams)?;
            let mut t = team::create_team(root, Team::new(slug.as_str(), name))
                .with_context(|| format!("failed to create team '{slug}'"))?;
            for m in &members {
                t = team::add_member(root, &slug, m)?;
            }
            log_activity(root, ActivityKind::TeamUpdated, &slug, user, "created")?;
            (t, format!("Created team '{slug}'."))
        }
        TeamSubcommand::Assign { team: slug, key_result } => {
            authorize(root, user, Action::ManageTeams)?;
            let all = objective::load_all(root).context("failed to load objectives")?;
            if objective::find_key_result(&all, &key_result).is_none() {
                bail!("key result not found: {key_result}");
            }
            let t = team::assign(root, &slug, &key_result)
                .with_context(|| format!("failed to assign '{key_result}' to '{slug}'"))?;
            log_activity(root, ActivityKind::TeamUpdated, &slug, user, format!("assigned {key_result}"))?;
            (t, format!("Assigned {key_result} to '{slug}'."))
        }
        TeamSubcommand::Unassign { team: slug, key_result } => {
            authorize(root, user, Action::ManageTeams)?;
            let t = team::unassign(root, &slug, &key_result)
                .with_context(|| format!("failed to unassign '{key_result}' from '{slug}'"))?;
            log_activity(root, ActivityKind::TeamUpdated, &slug, user, format!("unassigned {key_result}"))?;
            (t, format!("Unassigned {key_result} from '{slug}'."))
        }
    };

    if json {
        print_json(&t)
    } else {
        println!("{message}");
        Ok(())
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let teams = team::load_teams(root).context("failed to load teams")?;
    if json {
        return print_json(&teams);
    }
    if teams.is_empty() {
        println!("No teams.");
        return Ok(());
    }
    let rows = teams
        .iter()
        .map(|t| {
            vec![
                t.slug.clone(),
                t.name.clone(),
                t.members.join(", "),
                t.key_results.join(", "),
            ]
        })
        .collect();
    print_table(&["SLUG", "NAME", "MEMBERS", "KEY RESULTS"], rows);
    Ok(())
}
