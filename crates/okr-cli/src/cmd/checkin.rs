use crate::cmd::{authorize, parse_date};
use crate::output::{fmt_date, fmt_pct, print_json, print_table};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Subcommand;
use okr_core::{
    access::Action,
    checkin::{self, CheckinEntry},
    config::Config,
    cycle::Cycle,
    notification, objective,
    text::parse_number,
    types::Confidence,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum CheckinSubcommand {
    /// Record a check-in for one or more key results
    Submit {
        cycle: String,
        /// KR[:CONFIDENCE[:VALUE]], e.g. grow-kr1:high:75 (repeatable)
        #[arg(required = true, value_name = "ENTRY")]
        entries: Vec<String>,
        /// Check-in date (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show whether a check-in is due for a cycle
    Due { cycle: String },
    /// Show the check-in history of a key result
    History { cycle: String, key_result: String },
    /// Store reminder notifications for every due active cycle
    Remind,
}

pub fn run(
    root: &Path,
    subcmd: CheckinSubcommand,
    user: Option<&str>,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        CheckinSubcommand::Submit {
            cycle,
            entries,
            date,
        } => {
            authorize(root, user, Action::CheckIn)?;
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
            let entries = entries
                .iter()
                .map(|e| parse_entry(e))
                .collect::<anyhow::Result<Vec<_>>>()?;
            submit(root, &cycle, &entries, date, user, json)
        }
        CheckinSubcommand::Due { cycle } => due(root, &cycle, today, json),
        CheckinSubcommand::History { cycle, key_result } => history(root, &cycle, &key_result, json),
        CheckinSubcommand::Remind => {
            let config = authorize(root, user, Action::ManageCycles)?;
            let created = notification::remind(root, &config, today)
                .context("failed to store reminders")?;
            if json {
                return print_json(&created);
            }
            if created.is_empty() {
                println!("No reminders needed.");
            }
            for n in &created {
                println!("{}", n.message);
            }
            Ok(())
        }
    }
}

/// Parse `KR[:CONFIDENCE[:VALUE]]`. An empty confidence skips to the value
/// (`grow-kr1::75`).
fn parse_entry(raw: &str) -> anyhow::Result<CheckinEntry> {
    let mut parts = raw.splitn(3, ':');
    let key_result = parts.next().unwrap_or_default().trim().to_string();
    if key_result.is_empty() {
        bail!("invalid check-in entry '{raw}': missing key result id");
    }
    let confidence = match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(c) => Some(c.to_lowercase().parse::<Confidence>()?),
        None => None,
    };
    let current_value = match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => Some(
            parse_number(v)
                .with_context(|| format!("invalid check-in entry '{raw}': bad value '{v}'"))?,
        ),
        None => None,
    };
    Ok(CheckinEntry {
        key_result,
        confidence,
        current_value,
    })
}

fn submit(
    root: &Path,
    cycle: &str,
    entries: &[CheckinEntry],
    date: NaiveDate,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = checkin::submit_checkins(root, cycle, entries, date, user)
        .with_context(|| format!("failed to record check-in for '{cycle}'"))?;
    tracing::debug!(
        cycle,
        inserted = outcome.inserted.len(),
        skipped = outcome.skipped.len(),
        "check-in submitted"
    );

    if json {
        return print_json(&outcome);
    }
    println!(
        "Recorded {} check-in(s) for {cycle} on {date}.",
        outcome.inserted.len()
    );
    for kr in &outcome.skipped {
        println!("  skipped {kr}: already checked in on {date}");
    }
    Ok(())
}

fn due(root: &Path, cycle: &str, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let c = Cycle::load(root, cycle).with_context(|| format!("failed to load cycle '{cycle}'"))?;
    let objectives = objective::load_objectives(root, cycle)?;
    let checkins = checkin::load_checkins(root, cycle)?;
    let status = checkin::checkin_due(&c.checkin_dates, &checkins, today);
    let missing = match status.last_due_date {
        Some(d) if status.due => checkin::missing_on(&objectives, &checkins, d),
        _ => Vec::new(),
    };

    if json {
        return print_json(&serde_json::json!({
            "due": status.due,
            "overdue": status.overdue,
            "last_due_date": status.last_due_date,
            "missing_key_results": missing,
            "reminder": checkin::reminder_message(&c.name, &status, &config.checkins.reminder_template),
        }));
    }

    match (status.due, status.overdue) {
        (false, _) => match status.last_due_date {
            Some(d) => println!("Up to date (last check-in date {d})."),
            None => println!("No check-in date has been reached yet."),
        },
        (true, false) => println!("Check-in due today ({}).", fmt_date(status.last_due_date)),
        (true, true) => println!("Check-in overdue since {}.", fmt_date(status.last_due_date)),
    }
    for kr in missing {
        println!("  missing: {kr}");
    }
    Ok(())
}

fn history(root: &Path, cycle: &str, kr: &str, json: bool) -> anyhow::Result<()> {
    let objectives = objective::load_objectives(root, cycle)?;
    if objective::find_key_result(&objectives, kr).is_none() {
        Cycle::load(root, cycle).with_context(|| format!("failed to load cycle '{cycle}'"))?;
        return Err(okr_core::OkrError::KeyResultNotFound(kr.to_string()).into());
    }
    let checkins = checkin::load_checkins(root, cycle)?;
    let rows = checkin::history(&checkins, kr);

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No check-ins for {kr}.");
        return Ok(());
    }
    let table = rows
        .iter()
        .map(|c| {
            vec![
                c.date.to_string(),
                c.confidence.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                fmt_pct(c.progress),
                c.user.clone().unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(&["DATE", "CONFIDENCE", "PROGRESS", "USER"], table);
    Ok(())
}
