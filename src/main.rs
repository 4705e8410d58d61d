use anyhow::Context;
use clap::Parser;
use item_master_updater::utils::error::ErrorSeverity;
use item_master_updater::utils::{logger, validation::Validate};
use item_master_updater::{BatchUpdater, CliConfig, ServiceLayerCompany, UpdateEngine, UpdaterError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting item-master-updater");

    if let Err(e) = config.validate() {
        exit_with(e);
    }

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => exit_with(e),
    };

    tracing::info!(
        "Updating {} from {} using the {} strategy",
        settings.params.company_db,
        settings.csv_path,
        settings.update.name()
    );
    if settings.accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled");
    }

    let company = ServiceLayerCompany::new(settings.accept_invalid_certs)
        .context("failed to build the HTTP client")?;
    let updater = BatchUpdater::new(settings.update.strategy());
    let mut engine = UpdateEngine::new(
        company,
        settings.params,
        settings.csv_path,
        settings.load_options,
        updater,
    );

    let mut stdout = std::io::stdout();
    match engine.run(&mut stdout).await {
        Ok(report) => {
            tracing::info!(
                "Done: {} of {} items updated",
                report.updated(),
                report.total()
            );
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn exit_with(e: UpdaterError) -> ! {
    tracing::error!(
        "Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
