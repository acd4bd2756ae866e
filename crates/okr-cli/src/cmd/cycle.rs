use crate::cmd::{authorize, parse_date};
use crate::output::{fmt_date, fmt_pct, print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use okr_core::{
    access::Action,
    checkin,
    cycle::{self, Cycle},
    objective, progress,
    state::{log_activity, ActivityKind, State},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum CycleSubcommand {
    /// Create a cycle and register it
    Create {
        slug: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: Option<String>,
        /// Strategic theme
        #[arg(long)]
        theme: Option<String>,
        /// Scheduled check-in date (repeatable)
        #[arg(long = "checkin", value_name = "DATE")]
        checkins: Vec<String>,
    },
    /// List all cycles
    List,
    /// Show a cycle with its check-in status
    Show { slug: String },
    /// Update cycle metadata
    Update {
        slug: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// New theme; pass an empty string to clear it
        #[arg(long)]
        theme: Option<String>,
    },
    /// Delete a cycle with its objectives, links and check-ins
    Delete { slug: String },
    /// Add or remove scheduled check-in dates
    Schedule {
        slug: String,
        /// Dates (YYYY-MM-DD)
        #[arg(required = true)]
        dates: Vec<String>,
        /// Remove the dates instead of adding them
        #[arg(long)]
        remove: bool,
    },
}

pub fn run(
    root: &Path,
    subcmd: CycleSubcommand,
    user: Option<&str>,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        CycleSubcommand::Create {
            slug,
            name,
            start,
            end,
            theme,
            checkins,
        } => {
            authorize(root, user, Action::ManageCycles)?;
            create(root, &slug, &name, start, end, theme, &checkins, user, today, json)
        }
        CycleSubcommand::List => list(root, today, json),
        CycleSubcommand::Show { slug } => show(root, &slug, today, json),
        CycleSubcommand::Update {
            slug,
            name,
            start,
            end,
            theme,
        } => {
            authorize(root, user, Action::ManageCycles)?;
            update(root, &slug, name, start, end, theme, user, today, json)
        }
        CycleSubcommand::Delete { slug } => {
            authorize(root, user, Action::ManageCycles)?;
            cycle::delete(root, &slug, user)
                .with_context(|| format!("failed to delete cycle '{slug}'"))?;
            if json {
                print_json(&serde_json::json!({ "deleted": slug }))
            } else {
                println!("Deleted cycle '{slug}'.");
                Ok(())
            }
        }
        CycleSubcommand::Schedule {
            slug,
            dates,
            remove,
        } => {
            authorize(root, user, Action::ManageCycles)?;
            schedule(root, &slug, &dates, remove, user, json)
        }
    }
}

fn parse_opt(raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    raw.map(parse_date).transpose()
}

fn parse_all(raw: &[String]) -> anyhow::Result<Vec<NaiveDate>> {
    raw.iter().map(|d| parse_date(d)).collect()
}

fn cycle_json(c: &Cycle, today: NaiveDate) -> serde_json::Value {
    serde_json::json!({
        "slug": c.slug,
        "name": c.name,
        "status": c.status(today),
        "start_date": c.start_date,
        "end_date": c.end_date,
        "theme": c.theme,
        "checkin_dates": c.checkin_dates,
    })
}

#[allow(clippy::too_many_arguments)]
fn create(
    root: &Path,
    slug: &str,
    name: &str,
    start: Option<String>,
    end: Option<String>,
    theme: Option<String>,
    checkins: &[String],
    user: Option<&str>,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let state = State::load(root).context("failed to load state")?;
    let mut c = Cycle::new(slug, name, state.organization);
    c.start_date = parse_opt(start.as_deref())?;
    c.end_date = parse_opt(end.as_deref())?;
    c.set_theme(theme);
    c.schedule_checkins(&parse_all(checkins)?);

    let c = cycle::register(root, c, user)
        .with_context(|| format!("failed to create cycle '{slug}'"))?;
    tracing::debug!(cycle = %c.slug, "cycle registered");

    if json {
        print_json(&cycle_json(&c, today))
    } else {
        println!("Created cycle '{}' ({}).", c.slug, c.status(today));
        Ok(())
    }
}

fn list(root: &Path, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let cycles = Cycle::list(root).context("failed to list cycles")?;
    if json {
        let list: Vec<_> = cycles.iter().map(|c| cycle_json(c, today)).collect();
        return print_json(&list);
    }
    if cycles.is_empty() {
        println!("No cycles.");
        return Ok(());
    }
    let rows = cycles
        .iter()
        .map(|c| {
            vec![
                c.slug.clone(),
                c.name.clone(),
                c.status(today).to_string(),
                fmt_date(c.start_date),
                fmt_date(c.end_date),
                c.checkin_dates.len().to_string(),
            ]
        })
        .collect();
    print_table(&["SLUG", "NAME", "STATUS", "START", "END", "CHECK-INS"], rows);
    Ok(())
}

fn show(root: &Path, slug: &str, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let c = Cycle::load(root, slug).with_context(|| format!("failed to load cycle '{slug}'"))?;
    let objectives = objective::load_objectives(root, slug)?;
    let checkins = checkin::load_checkins(root, slug)?;
    let due = checkin::checkin_due(&c.checkin_dates, &checkins, today);
    let average = progress::cycle_average(slug, &objectives);

    if json {
        let mut value = cycle_json(&c, today);
        value["objective_count"] = serde_json::json!(objectives.len());
        value["average"] = serde_json::json!(average);
        value["checkin"] = serde_json::json!(due);
        return print_json(&value);
    }

    println!("Cycle:      {} ({})", c.name, c.slug);
    println!("Status:     {}", c.status(today));
    println!("Dates:      {} .. {}", fmt_date(c.start_date), fmt_date(c.end_date));
    if let Some(theme) = &c.theme {
        println!("Theme:      {theme}");
    }
    println!("Objectives: {}", objectives.len());
    println!("Progress:   {}", fmt_pct(average));
    let scheduled: Vec<String> = c.checkin_dates.iter().map(|d| d.to_string()).collect();
    println!(
        "Check-ins:  {}",
        if scheduled.is_empty() {
            "none scheduled".to_string()
        } else {
            scheduled.join(", ")
        }
    );
    if due.overdue {
        println!("            overdue since {}", fmt_date(due.last_due_date));
    } else if due.due {
        println!("            due today");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn update(
    root: &Path,
    slug: &str,
    name: Option<String>,
    start: Option<String>,
    end: Option<String>,
    theme: Option<String>,
    user: Option<&str>,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let mut c = Cycle::load(root, slug).with_context(|| format!("failed to load cycle '{slug}'"))?;
    if let Some(name) = name {
        c.rename(name);
    }
    let start = parse_opt(start.as_deref())?.or(c.start_date);
    let end = parse_opt(end.as_deref())?.or(c.end_date);
    c.set_dates(start, end)?;
    if theme.is_some() {
        c.set_theme(theme);
    }
    c.save(root).context("failed to save cycle")?;
    log_activity(root, ActivityKind::CycleUpdated, slug, user, "")?;

    if json {
        print_json(&cycle_json(&c, today))
    } else {
        println!("Updated cycle '{slug}'.");
        Ok(())
    }
}

fn schedule(
    root: &Path,
    slug: &str,
    dates: &[String],
    remove: bool,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut c = Cycle::load(root, slug).with_context(|| format!("failed to load cycle '{slug}'"))?;
    let dates = parse_all(dates)?;
    let changed = if remove {
        dates.iter().filter(|d| c.unschedule_checkin(**d)).count()
    } else {
        c.schedule_checkins(&dates)
    };
    c.save(root).context("failed to save cycle")?;
    log_activity(
        root,
        ActivityKind::CycleUpdated,
        slug,
        user,
        format!("{} {changed} check-in date(s)", if remove { "removed" } else { "added" }),
    )?;

    if json {
        print_json(&serde_json::json!({
            "slug": slug,
            "changed": changed,
            "checkin_dates": c.checkin_dates,
        }))
    } else {
        let scheduled: Vec<String> = c.checkin_dates.iter().map(|d| d.to_string()).collect();
        println!("Check-in dates for '{slug}': {}", scheduled.join(", "));
        Ok(())
    }
}
