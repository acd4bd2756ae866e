use crate::cmd::authorize;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use okr_core::{
    access::Action,
    config::Config,
    link,
    state::{log_activity, ActivityKind},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum LinkSubcommand {
    /// Link two objectives (direction follows links.convention)
    Add {
        cycle: String,
        source: String,
        target: String,
    },
    /// List stored links
    List { cycle: String },
    /// Remove a link
    Remove {
        cycle: String,
        source: String,
        target: String,
    },
}

pub fn run(root: &Path, subcmd: LinkSubcommand, user: Option<&str>, json: bool) -> anyhow::Result<()> {
    match subcmd {
        LinkSubcommand::Add {
            cycle,
            source,
            target,
        } => {
            let config = authorize(root, user, Action::EditObjectives)?;
            let created = link::add_link(root, &cycle, &source, &target, config.links.convention)
                .with_context(|| format!("failed to link '{source}' -> '{target}'"))?;
            log_activity(
                root,
                ActivityKind::LinkCreated,
                &cycle,
                user,
                format!("{source} -> {target}"),
            )?;
            if json {
                print_json(&created)
            } else {
                println!(
                    "Linked {} -> {} ({:?}, {}).",
                    created.source, created.target, created.link_type, config.links.convention
                );
                Ok(())
            }
        }
        LinkSubcommand::List { cycle } => {
            let config = Config::load(root).context("failed to load config")?;
            okr_core::cycle::Cycle::load(root, &cycle)
                .with_context(|| format!("failed to load cycle '{cycle}'"))?;
            let links = link::load_links(root, &cycle)?;
            if json {
                return print_json(&links);
            }
            if links.is_empty() {
                println!("No links in '{cycle}'.");
                return Ok(());
            }
            let rows = links
                .iter()
                .map(|l| {
                    let (parent, child) = config.links.convention.parent_child(l);
                    vec![
                        l.source.clone(),
                        l.target.clone(),
                        parent.to_string(),
                        child.to_string(),
                    ]
                })
                .collect();
            print_table(&["SOURCE", "TARGET", "PARENT", "CHILD"], rows);
            Ok(())
        }
        LinkSubcommand::Remove {
            cycle,
            source,
            target,
        } => {
            authorize(root, user, Action::EditObjectives)?;
            link::remove_link(root, &cycle, &source, &target)
                .with_context(|| format!("failed to remove link '{source}' -> '{target}'"))?;
            log_activity(
                root,
                ActivityKind::LinkDeleted,
                &cycle,
                user,
                format!("{source} -> {target}"),
            )?;
            if json {
                print_json(&serde_json::json!({ "source": source, "target": target, "removed": true }))
            } else {
                println!("Removed link {source} -> {target}.");
                Ok(())
            }
        }
    }
}
