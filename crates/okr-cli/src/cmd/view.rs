//! Read-only views of one cycle: hierarchy tree, dashboard and scoreboard.

use crate::output::{fmt_pct, print_json, print_table};
use anyhow::Context;
use okr_core::{
    checkin,
    config::Config,
    cycle::Cycle,
    hierarchy::build_hierarchy,
    link,
    objective::{self, Objective},
    progress::{cycle_dashboard, objective_average},
    scoreboard::build_scoreboard,
};
use std::path::Path;

fn load_cycle(root: &Path, slug: &str) -> anyhow::Result<(Cycle, Vec<Objective>)> {
    let c = Cycle::load(root, slug).with_context(|| format!("failed to load cycle '{slug}'"))?;
    let objectives = objective::load_objectives(root, slug)?;
    Ok((c, objectives))
}

fn tree_line(depth: usize, o: &Objective) -> String {
    format!(
        "{}[{}] {} ({}) {}",
        "  ".repeat(depth),
        o.objective_type,
        o.statement,
        o.id,
        fmt_pct(objective_average(o))
    )
}

pub fn tree(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let (c, objectives) = load_cycle(root, slug)?;
    let links = link::load_links(root, slug)?;
    let h = build_hierarchy(
        &objectives,
        &links,
        config.links.convention,
        config.links.duplicate_parent,
    );

    if json {
        return print_json(&h);
    }

    println!("{}", c.name);
    if h.groups.is_empty() && h.unlinked.is_empty() {
        println!("  (no objectives)");
    }
    for g in &h.groups {
        println!("{}", tree_line(1, &g.strategic));
        for t in &g.children {
            println!("{}", tree_line(2, &t.tactical));
            for op in &t.children {
                println!("{}", tree_line(3, op));
            }
        }
    }
    if !h.unlinked.is_empty() {
        println!("\nUnlinked:");
        for o in &h.unlinked {
            println!("{}", tree_line(1, o));
        }
    }
    Ok(())
}

pub fn dashboard(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let (c, objectives) = load_cycle(root, slug)?;
    let d = cycle_dashboard(slug, &objectives);

    if json {
        return print_json(&d);
    }

    println!("{}: overall {}", c.name, fmt_pct(d.average));
    println!(
        "{} objectives, {} key results\n",
        d.objective_count, d.key_result_count
    );

    let by_type = d
        .by_type
        .iter()
        .map(|t| {
            vec![
                t.objective_type.to_string(),
                t.objectives.to_string(),
                fmt_pct(t.average),
            ]
        })
        .collect();
    print_table(&["TYPE", "OBJECTIVES", "AVERAGE"], by_type);
    println!();

    let by_ambition = d
        .by_ambition
        .iter()
        .map(|a| {
            vec![
                a.ambition.to_string(),
                a.key_results.to_string(),
                fmt_pct(a.average),
            ]
        })
        .collect();
    print_table(&["AMBITION", "KEY RESULTS", "AVERAGE"], by_ambition);
    Ok(())
}

pub fn scoreboard(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let (c, objectives) = load_cycle(root, slug)?;
    let checkins = checkin::load_checkins(root, slug)?;
    let rows = build_scoreboard(&objectives, &checkins, &c.checkin_dates);

    if json {
        return print_json(&serde_json::json!({
            "dates": c.checkin_dates,
            "rows": rows,
        }));
    }
    if c.checkin_dates.is_empty() {
        println!("No check-in dates scheduled for '{slug}'.");
        return Ok(());
    }

    let date_headers: Vec<String> = c
        .checkin_dates
        .iter()
        .map(|d| d.format("%m-%d").to_string())
        .collect();
    let mut headers: Vec<&str> = vec!["KEY RESULT", "TYPE", "PROGRESS"];
    headers.extend(date_headers.iter().map(String::as_str));

    let table = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                r.key_result_id.clone(),
                r.objective_type.to_string(),
                fmt_pct(r.progress),
            ];
            cells.extend(
                r.confidences()
                    .into_iter()
                    .map(|c| c.map(|c| c.color().to_string()).unwrap_or_else(|| "·".into())),
            );
            cells
        })
        .collect();
    print_table(&headers, table);
    Ok(())
}
