use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lodge_app::{bookings::clock::SystemClock, App};
use lodge_kernel::settings::Settings;

/// Operator tooling for the lodge reservation service.
#[derive(Debug, Parser)]
#[command(name = "lodge-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Clear the date occupancy index (maintenance reset; bookings are kept)
    ClearDates,
    /// Print availability for a window as JSON
    Availability {
        /// First date, YYYY-MM-DD (defaults to tomorrow)
        #[arg(long)]
        from: Option<String>,
        /// End date, exclusive, YYYY-MM-DD (defaults to one month out)
        #[arg(long)]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load lodge settings")?;
    lodge_telemetry::init(&settings.telemetry);

    tracing::info!(env = ?settings.environment, command = ?cli.command, "lodge-cli starting");

    // Bootstrapping applies migrations, which is all `migrate` needs.
    let app = App::bootstrap(settings, Arc::new(SystemClock)).await?;

    match cli.command {
        Command::Serve => app.serve().await?,
        Command::Migrate => tracing::info!("migrations complete"),
        Command::ClearDates => {
            let removed = app.bookings()?.delete_all_dates().await?;
            println!("cleared {removed} occupied dates");
        }
        Command::Availability { from, to } => {
            let availability = app
                .bookings()?
                .availability(from.as_deref(), to.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&availability)?);
        }
    }

    Ok(())
}
