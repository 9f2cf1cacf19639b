use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use sitemigrate_core::config::{MigrateConfig, load_config};
use sitemigrate_core::convert::{DEFAULT_PANDOC_BINARY, PandocConverter};
use sitemigrate_core::layout::OutputLayout;
use sitemigrate_core::pipeline::{MigrationReport, plan_migration, run_migration};
use sitemigrate_core::snapshot::read_snapshot;

#[derive(Debug, Parser)]
#[command(
    name = "sitemigrate",
    version,
    about = "Migrate a CMS export into a static Markdown file tree"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "TOML config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print reports as JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the full migration: resolve, fetch media, convert")]
    Migrate(MigrateArgs),
    #[command(about = "Offline dry pass: resolve and reconcile, write the checkpoint snapshot")]
    Plan(PlanArgs),
    #[command(about = "Summarize a snapshot written by a previous run")]
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[arg(value_name = "EXPORT_CSV")]
    export: PathBuf,
    #[arg(long, value_name = "HOST", help = "Base host of the exported site")]
    site_host: Option<String>,
    #[arg(long, value_name = "DIR", default_value = "site", help = "Output root")]
    out: PathBuf,
    #[arg(long, value_name = "BINARY", default_value = DEFAULT_PANDOC_BINARY)]
    pandoc: String,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[arg(value_name = "EXPORT_CSV")]
    export: PathBuf,
    #[arg(long, value_name = "HOST")]
    site_host: Option<String>,
    #[arg(long, value_name = "DIR", default_value = "site")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[arg(value_name = "SNAPSHOT_JSON")]
    snapshot: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("sitemigrate.toml"));
    let config = load_config(&config_path)?;

    match &cli.command {
        Commands::Migrate(args) => {
            let site_host = resolve_site_host(args.site_host.as_deref(), &config)?;
            let layout = OutputLayout::new(&args.out);
            let converter = PandocConverter::new(&args.pandoc);
            let report = run_migration(&args.export, &site_host, &layout, &config, &converter)?;
            print_report(&report, cli.json)?;
            println!("snapshot: {}", layout.snapshot_path.display());
        }
        Commands::Plan(args) => {
            let site_host = resolve_site_host(args.site_host.as_deref(), &config)?;
            let layout = OutputLayout::new(&args.out);
            let (_site, report) = plan_migration(&args.export, &site_host, &layout)?;
            print_report(&report, cli.json)?;
            println!("checkpoint: {}", layout.snapshot_path.display());
        }
        Commands::Inspect(args) => {
            let site = read_snapshot(&args.snapshot)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&site)?);
            } else {
                println!("site host: {}", site.site_host);
                println!(
                    "{} pages, {} posts, {} media",
                    site.pages.len(),
                    site.posts.len(),
                    site.media.len()
                );
                print_list("failed media fetches", &site.failed_media);
                print_list("failed conversions", &site.failed_conversions);
            }
        }
    }

    Ok(())
}

fn resolve_site_host(flag: Option<&str>, config: &MigrateConfig) -> Result<String> {
    if let Some(host) = flag {
        return Ok(host.to_string());
    }
    if let Some(host) = config.site_host() {
        return Ok(host);
    }
    bail!(
        "no site host configured; pass --site-host, set SITEMIGRATE_SITE_HOST, or add [site] host to the config file"
    )
}

fn print_report(report: &MigrationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} pages, {} posts, {} media ({} synthesized, {} export rows skipped)",
        report.pages, report.posts, report.media, report.synthesized_media, report.skipped_rows
    );
    println!(
        "media: {} saved, {} already cached, {} failed",
        report.media_saved,
        report.media_cached,
        report.failed_media.len()
    );
    println!(
        "documents: {} converted, {} failed",
        report.converted,
        report.failed_conversions.len()
    );
    print_list("resolve failures", &report.resolve_failures);
    print_list("long paths", &report.long_paths);
    print_list("failed media fetches", &report.failed_media);
    print_list("conversion errors", &report.conversion_errors);
    print_list("rewrite warnings", &report.rewrite_warnings);
    Ok(())
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{label}:");
    for item in items {
        println!("  - {item}");
    }
}
