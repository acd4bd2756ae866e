use crate::output::{fmt_date, print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use okr_core::{cycle::Cycle, state::State};
use std::path::Path;

pub fn run(root: &Path, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let state = State::load(root).context("failed to load state")?;
    let cycles = Cycle::list(root).context("failed to list cycles")?;

    if json {
        let list: Vec<serde_json::Value> = cycles
            .iter()
            .map(|c| {
                serde_json::json!({
                    "slug": c.slug,
                    "name": c.name,
                    "status": c.status(today),
                    "start_date": c.start_date,
                    "end_date": c.end_date,
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "organization": state.organization,
            "today": today,
            "cycles": list,
            "last_activity": state.last_activity(),
        }));
    }

    println!("Organization: {}", state.organization);
    println!("Today:        {today}");
    if cycles.is_empty() {
        println!("\nNo cycles yet.");
    } else {
        println!();
        let rows = cycles
            .iter()
            .map(|c| {
                vec![
                    c.slug.clone(),
                    c.name.clone(),
                    c.status(today).to_string(),
                    fmt_date(c.start_date),
                    fmt_date(c.end_date),
                ]
            })
            .collect();
        print_table(&["SLUG", "NAME", "STATUS", "START", "END"], rows);
    }
    if let Some(last) = state.last_activity() {
        let who = last.user.as_deref().unwrap_or("-");
        println!(
            "\nLast activity: {:?} {} by {who} at {}",
            last.kind,
            last.subject,
            last.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
