use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use seatable_sync::profiles::{self, Profile, Selection};
use seatable_sync::seatable::SeaTableClient;
use seatable_sync::sync::{self, RunReport};
use seatable_sync::{Result, SyncError, config};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the SeaTable server to talk to.
const SERVER_URL_VAR: &str = "SEATABLE_SERVER_URL";

fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let discovered = profiles::discover(&cli.config_dir)?;

    let selected = match &cli.profile {
        Some(name) => discovered
            .iter()
            .find(|profile| &profile.file_name == name)
            .ok_or_else(|| {
                SyncError::Config(format!(
                    "profile '{name}' not found in {}",
                    cli.config_dir.display()
                ))
            })?,
        None => match prompt_for_profile(&discovered)? {
            Selection::Exit => {
                println!("Exiting.");
                return Ok(0);
            }
            Selection::Profile(index) => &discovered[index],
        },
    };

    println!(
        "\nSelected: {} ({})",
        selected.display_name, selected.file_name
    );

    // Credentials are resolved before any network traffic.
    let api_token = profiles::resolve_token(selected)?;
    let server_url = read_env(SERVER_URL_VAR)?;
    let profile = config::load_profile(&selected.path)?;

    let client = SeaTableClient::connect(&server_url, &api_token)?;
    let report = sync::sync_profile(&client, &profile);
    print_summary(&report);

    Ok(0)
}

fn prompt_for_profile(discovered: &[Profile]) -> Result<Selection> {
    println!("\n===== Excel sync profiles =====");
    for (index, profile) in discovered.iter().enumerate() {
        println!(
            "{}. {} ({})",
            index + 1,
            profile.display_name,
            profile.file_name
        );
    }
    println!("\n0. Exit");

    loop {
        print!("\nSelect a profile to run (1): ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        match profiles::parse_selection(&input, discovered.len()) {
            Some(selection) => return Ok(selection),
            None => println!(
                "Invalid choice, enter a number between 0 and {}.",
                discovered.len()
            ),
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Synchronise Excel workbook sheets into SeaTable tables."
)]
struct Cli {
    /// Directory scanned for sync profile files.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Profile file name to run without the interactive menu.
    #[arg(long)]
    profile: Option<String>,
}

fn read_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SyncError::MissingCredential(name.to_string())),
    }
}

fn print_summary(report: &RunReport) {
    println!();
    for table in &report.tables {
        match &table.error {
            Some(error) => println!("✗ {}: {error}", table.table),
            None if table.failed_chunks() > 0 => println!(
                "⚠ {}: {} rows read, {} chunk(s) failed",
                table.table,
                table.source_rows,
                table.failed_chunks()
            ),
            None => println!("✓ {}: {} rows synced", table.table, table.source_rows),
        }
    }
    if report.succeeded() {
        println!("\nAll tables synced.");
    } else {
        println!("\nRun finished with failures, see the log above.");
    }
}
