use clap::Parser;
use fare_etl::config::cli::{Command, EstimateArgs};
use fare_etl::core::estimate::{calibrate_tariffs, estimate_fare};
use fare_etl::core::etl::EtlOutcome;
use fare_etl::report::chart::format_value;
use fare_etl::utils::{logger, validation::Validate};
use fare_etl::{CliConfig, EtlEngine, EtlError, FareConfig, FarePipeline, LocalStorage};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting fare-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ fare-etl failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &CliConfig) -> Result<(), EtlError> {
    cli.validate()?;
    let config = cli.resolve()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    if cli.dry_run {
        display_config_summary(&config);
        return Ok(());
    }

    match cli.command() {
        Command::Analyze => {
            let output_path = analyze(cli, config).await?.output_path;
            println!();
            println!("📁 Report saved to: {}", output_path);
        }
        Command::Estimate(args) => estimate(cli, config, &args).await?,
    }

    Ok(())
}

async fn analyze(cli: &CliConfig, config: FareConfig) -> Result<EtlOutcome, EtlError> {
    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = FarePipeline::new(LocalStorage::default(), config).with_text_chart(cli.verbose);
    let mut engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);
    engine.run().await
}

async fn estimate(cli: &CliConfig, config: FareConfig, args: &EstimateArgs) -> Result<(), EtlError> {
    let currency = config.report.currency_symbol.clone();
    let mut tariffs = match &args.provider {
        Some(provider) => {
            let tariff = config
                .tariff(provider)
                .ok_or_else(|| EtlError::ValidationError {
                    message: format!("no tariff configured for provider '{}'", provider),
                })?;
            vec![tariff.clone()]
        }
        None => config.tariffs.clone(),
    };

    if args.from_analysis {
        let outcome = analyze(cli, config).await?;
        tariffs = calibrate_tariffs(&tariffs, &outcome.report);
        tracing::info!("🔧 Tariffs calibrated from measured fare per km");
    }

    let trip = args.trip();
    println!();
    println!(
        "🧮 Estimate for {:.2} km, {:.0} min, {:.1}x surge:",
        trip.distance_km(),
        trip.duration_minutes(),
        trip.surge
    );
    for tariff in &tariffs {
        let estimate = estimate_fare(tariff, &trip)?;
        println!(
            "  {:<12} {} ({}/km)",
            estimate.provider,
            format_value(&currency, estimate.price),
            format_value(&currency, estimate.per_km)
        );
    }

    Ok(())
}

fn display_config_summary(config: &FareConfig) {
    println!("📋 Configuration Summary:");
    println!("  Title: {}", config.report.title);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.report.output_formats.join(", "));
    if let Some(compression) = config.compression() {
        println!("  Compression: {} (ZIP)", compression.filename);
    }
    println!();
    println!("🚕 Providers:");
    for provider in &config.providers {
        println!("  {} <- {}", provider.name, provider.path);
        println!(
            "    fare column: {}, conversion: x{}, z-score: {}, fill missing: {}",
            provider.fare_column,
            provider.conversion_rate,
            provider
                .zscore_threshold
                .map(|t| format!("|z| < {}", t))
                .unwrap_or_else(|| "off".to_string()),
            provider.fill_missing
        );
        println!("    distance: {:?}", provider.distance);
    }
    println!();
    println!("✅ Dry run complete. No data was read.");
}
