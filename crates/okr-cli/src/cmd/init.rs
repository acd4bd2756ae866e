use anyhow::Context;
use okr_core::{config::Config, io, paths, state::State};
use std::path::Path;

pub fn run(root: &Path, organization: Option<&str>) -> anyhow::Result<()> {
    let organization = organization
        .map(str::to_string)
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "organization".to_string());

    println!("Initializing OKRs in: {}", root.display());

    for dir in [paths::OKR_DIR, paths::CYCLES_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&organization)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    if paths::state_path(root).exists() {
        println!("  exists:  {}", paths::STATE_FILE);
    } else {
        State::new(&organization)
            .save(root)
            .context("failed to write state.yaml")?;
        println!("  created: {}", paths::STATE_FILE);
    }

    println!("\nOrganization: {organization}");
    println!("Next: okr cycle create <slug> --name <name> --start <date> --end <date>");
    Ok(())
}
