use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use okr_core::notification;
use std::path::Path;

#[derive(Subcommand)]
pub enum NotificationSubcommand {
    /// List notifications for the current user
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification read
    Read { id: String },
}

pub fn run(
    root: &Path,
    subcmd: NotificationSubcommand,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        NotificationSubcommand::List { unread } => {
            let items = notification::load_notifications(root)
                .context("failed to load notifications")?;
            let visible = notification::for_user(&items, user, unread);
            if json {
                return print_json(&visible);
            }
            if visible.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            let rows = visible
                .iter()
                .map(|n| {
                    vec![
                        n.id.clone(),
                        n.created_at.format("%Y-%m-%d").to_string(),
                        if n.read { "read" } else { "unread" }.to_string(),
                        n.message.clone(),
                    ]
                })
                .collect();
            print_table(&["ID", "DATE", "STATE", "MESSAGE"], rows);
            Ok(())
        }
        NotificationSubcommand::Read { id } => {
            let n = notification::mark_read(root, &id)
                .with_context(|| format!("failed to mark notification '{id}' read"))?;
            if json {
                print_json(&n)
            } else {
                println!("Marked '{}' read.", n.id);
                Ok(())
            }
        }
    }
}
