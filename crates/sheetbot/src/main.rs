//! Sheetbot binary.
//!
//! ```bash
//! SPREADSHEET_ID=... GOOGLE_ACCESS_TOKEN=... TELEGRAM_BOT_TOKEN=... \
//!     TELEGRAM_CHAT_ID=... cargo run -p sheetbot -- run
//! ```

use clap::Parser;
use sheetbot::{config, log_filter, App, Cli, Command, OffsetCommand, Settings};
use sheetbot_chat::{render_row, PublishOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Secrets from the config directory first, then the working directory
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter(cli.verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    let app = App::build(settings)?;

    match cli.command {
        Command::Run => {
            let tables: Vec<&str> = app.pollers().iter().map(|p| p.table()).collect();
            tracing::info!(tables = ?tables, interval = ?app.settings().poll_interval, "Sheetbot started");
            println!("Watching: {}", tables.join(", "));
            if let Some(sheet) = &app.settings().inventory_sheet {
                println!(
                    "Inventory: {} every {}s",
                    sheet,
                    app.settings().inventory_refresh.as_secs()
                );
            }
            println!("Press Ctrl+C to stop");
            app.run().await?;
        }
        Command::Tick { table } => {
            let mut failed = false;
            for (table, result) in app.tick(table.as_deref()).await? {
                match result {
                    Ok(outcome) => println!("{}: {}", table, outcome),
                    Err(e) => {
                        failed = true;
                        println!("{}: FAILED {}", table, e);
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
        Command::Pending { table } => {
            for (table, pending) in app.pending(table.as_deref()).await? {
                let stored = pending
                    .stored
                    .map_or_else(|| "none".to_string(), |o| o.to_string());
                println!(
                    "{}: stored offset {}, {} data row(s), {} new, {} blank",
                    table,
                    stored,
                    pending.total,
                    pending.rows.len(),
                    pending.blank
                );
                for row in &pending.rows {
                    println!("  {}", render_row(row));
                }
            }
        }
        Command::Offset { action } => match action {
            OffsetCommand::Show { table } => {
                for (table, location, offset) in app.offsets(table.as_deref()).await? {
                    let value = offset.map_or_else(|| "unset".to_string(), |o| o.to_string());
                    println!("{}: {} ({})", table, value, location);
                }
            }
            OffsetCommand::Set { table, offset } => {
                app.set_offset(&table, offset).await?;
                println!("{}: offset set to {}", table, offset);
            }
        },
        Command::Stats => match app.stats_reporter()?.publish().await? {
            PublishOutcome::Empty => println!("No stats to report"),
            PublishOutcome::Edited(id) => println!("Edited stats message {}", id),
            PublishOutcome::Posted(Some(id)) => println!("Posted stats message {}", id),
            PublishOutcome::Posted(None) => println!("Posted stats message"),
        },
        Command::Inventory => match app.inventory_reporter()?.publish().await? {
            PublishOutcome::Empty => println!("No inventory rows to report"),
            PublishOutcome::Edited(id) => println!("Edited inventory message {}", id),
            PublishOutcome::Posted(Some(id)) => println!("Posted inventory message {}", id),
            PublishOutcome::Posted(None) => println!("Posted inventory message"),
        },
    }

    Ok(())
}
