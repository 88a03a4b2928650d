use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tos_harvester::{DatasetWriter, Harvester, HttpSource, Settings, SkillRegistry, Source};

#[derive(Parser)]
#[command(name = "tos_harvester", about = "Tower of Saviors card catalog harvester")]
struct Cli {
    /// Settings file (default: ./harvest.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest every gallery page into the cards and skills files
    Run {
        /// Only walk patterns whose template contains this text (repeatable)
        #[arg(short, long)]
        pattern: Vec<String>,
        /// Hide the per-page progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// List the index pages a run would visit
    Plan,
    /// List the card links found on one index page
    Scan { url: String },
    /// Extract one card page and print it as JSON
    Extract { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    init_tracing(&settings)?;

    let t0 = Instant::now();
    let source = Arc::new(
        HttpSource::new(&settings.user_agent, settings.fetch_timeout())
            .context("Failed to create HTTP client")?,
    );

    match cli.command {
        Commands::Run { pattern, quiet } => {
            if !pattern.is_empty() {
                settings
                    .patterns
                    .retain(|p| pattern.iter().any(|name| p.template.contains(name.as_str())));
            }
            let mut harvester = Harvester::new(source, &settings)?.with_progress(!quiet);
            let mut writer = DatasetWriter::create(
                &settings.output.cards,
                &settings.output.skills,
                settings.delimiter()?,
                settings.output.write_headers,
            )
            .context("Failed to open output files")?;
            println!("Harvesting {} gallery pages...", harvester.plan().len());
            let summary = harvester.run(&mut writer).await?;
            println!(
                "Done: {} pages ({} skipped), {} cards, {} failed, {} skills.",
                summary.pages,
                summary.skipped_pages,
                summary.rows,
                summary.failed_records,
                summary.skills
            );
            if summary.duplicate_ids > 0 {
                println!("{} duplicate card ids (see log)", summary.duplicate_ids);
            }
            println!(
                "Wrote {} and {}",
                settings.output.cards.display(),
                settings.output.skills.display()
            );
        }
        Commands::Plan => {
            let harvester = Harvester::new(source, &settings)?;
            let plan = harvester.plan();
            for window in &plan {
                println!("{:>5}-{:<5} {}", window.lo, window.hi, window.url);
            }
            println!("\n{} index pages", plan.len());
        }
        Commands::Scan { url } => {
            let harvester = Harvester::new(source, &settings)?;
            let locators = harvester.scan(&url).await?;
            for (i, locator) in locators.iter().enumerate() {
                println!("{:>3} {}", i + 1, locator);
            }
            println!("\n{} cards", locators.len());
        }
        Commands::Extract { url } => {
            let parser = tos_harvester::PageParser::from_settings(&settings)?;
            let html = source
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch card page {}", url))?;
            let registry = SkillRegistry::new();
            let card = parser.card(&html, &url, &registry);
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
