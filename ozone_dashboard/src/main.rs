use clap::Parser;
use ozone_dashboard::{serve, AppState, Cli, Command, DisplayTable, Result};
use prophet_forecast::{load_model, request_forecast, Horizon};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    // Logs go to stderr so `export` can write CSV to stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ozone_dashboard=info,prophet_forecast=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "stopping");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config;
    config.validate()?;

    // Without a model there is nothing to serve
    let model = load_model(&config.model_path)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::new(model, config.seed)?.with_sessions(config.session_store());
            serve(config.bind_addr()?, state).await
        }
        Command::Export { days, output } => {
            let forecast = request_forecast(&model, Horizon::new(days)?, config.seed)?;
            let csv = DisplayTable::from_forecast(&forecast).to_csv()?;
            match output {
                Some(path) => {
                    fs::write(&path, csv)?;
                    tracing::info!(path = %path.display(), days, "forecast exported");
                }
                None => io::stdout().write_all(csv.as_bytes())?,
            }
            Ok(())
        }
    }
}
