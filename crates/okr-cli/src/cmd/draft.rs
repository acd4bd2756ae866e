use crate::cmd::authorize;
use crate::output::{fmt_date, print_json};
use anyhow::Context;
use clap::Subcommand;
use okr_assist::{AssistConfig, DraftClient};
use okr_core::{
    access::Action,
    config::Config,
    draft::{self, Draft},
    state::State,
};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum DraftSubcommand {
    /// Parse a draft (JSON or labelled outline) and print its structure
    Parse {
        /// File to read; `-` reads stdin
        file: PathBuf,
    },
    /// Parse a draft and create a cycle from it
    Import {
        /// File to read; `-` reads stdin
        file: PathBuf,
        /// Slug for the new cycle
        #[arg(long)]
        slug: String,
    },
    /// Ask the configured AI endpoint for a draft
    Generate {
        /// What the cycle should focus on
        prompt: String,
        /// Import the result as a new cycle with this slug
        #[arg(long = "import", value_name = "SLUG")]
        import_as: Option<String>,
        /// Also write the raw response to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: DraftSubcommand, user: Option<&str>, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DraftSubcommand::Parse { file } => {
            let text = read_input(&file)?;
            let d = draft::parse_ai_response(&text).context("failed to parse draft")?;
            show(&d, json)
        }
        DraftSubcommand::Import { file, slug } => {
            let config = authorize(root, user, Action::ManageCycles)?;
            let text = read_input(&file)?;
            let d = draft::parse_ai_response(&text).context("failed to parse draft")?;
            import(root, &d, &slug, &config, user, json)
        }
        DraftSubcommand::Generate {
            prompt,
            import_as,
            output,
        } => {
            let config = Config::load(root).context("failed to load config")?;
            if import_as.is_some() {
                authorize(root, user, Action::ManageCycles)?;
            }
            let organization = State::load(root)
                .map(|s| s.organization)
                .unwrap_or_else(|_| config.organization.name.clone());
            let raw = generate(&config, &prompt, &organization)?;
            if let Some(path) = &output {
                std::fs::write(path, &raw)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            let d = draft::parse_ai_response(&raw).context("failed to parse generated draft")?;
            match import_as {
                Some(slug) => import(root, &d, &slug, &config, user, json),
                None => show(&d, json),
            }
        }
    }
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
    }
}

fn generate(config: &Config, prompt: &str, organization: &str) -> anyhow::Result<String> {
    let api_key = AssistConfig::api_key_from_env(&config.ai.api_key_env)?;
    let mut assist = AssistConfig::new(&config.ai.endpoint, &config.ai.model, api_key);
    assist.temperature = config.ai.temperature;
    assist.max_tokens = config.ai.max_tokens;
    let client = DraftClient::new(assist);

    tracing::info!(model = %config.ai.model, "requesting draft");
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let raw = rt
        .block_on(client.generate(prompt, organization))
        .context("draft generation failed")?;
    Ok(raw)
}

fn import(
    root: &Path,
    d: &Draft,
    slug: &str,
    config: &Config,
    user: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let m = draft::import_draft(root, d, slug, config.links.convention, user)
        .with_context(|| format!("failed to import draft as '{slug}'"))?;
    if json {
        return print_json(&m);
    }
    let krs: usize = m.objectives.iter().map(|o| o.key_results.len()).sum();
    println!(
        "Imported cycle '{}': {} objectives, {krs} key results, {} links.",
        m.cycle.slug,
        m.objectives.len(),
        m.links.len()
    );
    Ok(())
}

fn show(d: &Draft, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(d);
    }
    println!("Cycle:  {}", if d.cycle.name.is_empty() { "-" } else { &d.cycle.name });
    println!(
        "Dates:  {} .. {}",
        fmt_date(d.cycle.start_date),
        fmt_date(d.cycle.end_date)
    );
    if let Some(theme) = &d.cycle.theme {
        println!("Theme:  {theme}");
    }
    for o in &d.objectives {
        let parent = d
            .links
            .iter()
            .find(|l| l.child == o.number)
            .map(|l| format!(" (under {})", l.parent))
            .unwrap_or_default();
        println!("\n{}. [{}] {}{parent}", o.number, o.objective_type, o.text);
        for kr in &o.key_results {
            let target = kr
                .target_value
                .map(|t| format!(" -> {t}{}", kr.unit.as_deref().unwrap_or("")))
                .unwrap_or_default();
            println!("   - ({}) {}{target}", kr.ambition, kr.text);
        }
    }
    Ok(())
}
