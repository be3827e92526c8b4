use crate::config::toml_config::FareConfig;
use crate::core::estimate::{DistanceUnit, TimeUnit, TripRequest};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "fare-etl")]
#[command(about = "Compare average fare per km across ride-hailing providers")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Ola export (overrides the configured path)
    #[arg(long, global = true)]
    pub ola: Option<String>,

    /// Uber export (overrides the configured path)
    #[arg(long, global = true)]
    pub uber: Option<String>,

    /// Namma Yatri trip log (overrides the configured path)
    #[arg(long, global = true)]
    pub cab: Option<String>,

    /// Output directory
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log CPU and memory usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Show the resolved configuration without reading any data
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean the datasets and chart fare per km (default)
    Analyze,
    /// Estimate a trip price from the tariff table
    Estimate(EstimateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    /// Trip distance
    #[arg(long)]
    pub distance: f64,

    #[arg(long, value_enum, default_value_t = DistanceUnit::Km)]
    pub unit: DistanceUnit,

    /// Trip duration
    #[arg(long)]
    pub time: f64,

    #[arg(long, value_enum, default_value_t = TimeUnit::Minutes)]
    pub time_unit: TimeUnit,

    /// Surge multiplier, 1.0 to 3.0
    #[arg(long, default_value_t = 1.0)]
    pub surge: f64,

    /// Only estimate for this provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Run the analysis first and use the measured fare per km
    #[arg(long)]
    pub from_analysis: bool,
}

impl EstimateArgs {
    pub fn trip(&self) -> TripRequest {
        TripRequest {
            distance: self.distance,
            distance_unit: self.unit,
            duration: self.time,
            time_unit: self.time_unit,
            surge: self.surge,
        }
    }
}

impl CliConfig {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Analyze)
    }

    /// Loads the TOML file (or the built-in defaults) and applies the
    /// command-line overrides on top.
    pub fn resolve(&self) -> Result<FareConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                FareConfig::from_file(path)?
            }
            None => FareConfig::default(),
        };

        for (name, path) in [
            ("Ola", &self.ola),
            ("Uber", &self.uber),
            ("Namma Yatri", &self.cab),
        ] {
            if let Some(path) = path {
                config.set_provider_path(name, path)?;
                tracing::info!("🔧 {} input overridden to: {}", name, path);
            }
        }

        if let Some(output) = &self.output {
            config.report.output_path = output.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("config", &self.config),
            ("ola", &self.ola),
            ("uber", &self.uber),
            ("cab", &self.cab),
            ("output", &self.output),
        ] {
            if let Some(value) = value {
                validate_path(field, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_to_analyze() {
        let cli = CliConfig::parse_from(["fare-etl"]);
        assert!(matches!(cli.command(), Command::Analyze));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_path_overrides_apply() {
        let cli = CliConfig::parse_from([
            "fare-etl",
            "--uber",
            "/data/uber_copy.csv",
            "--cab",
            "/data/cab_copy.csv",
            "--output",
            "/tmp/report",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.provider("Uber").unwrap().path, "/data/uber_copy.csv");
        assert_eq!(config.provider("Namma Yatri").unwrap().path, "/data/cab_copy.csv");
        assert_eq!(config.provider("Ola").unwrap().path, "data/combined_sheets.csv");
        assert_eq!(config.output_path(), "/tmp/report");
    }

    #[test]
    fn test_override_with_wrong_extension_fails_validation() {
        let cli = CliConfig::parse_from(["fare-etl", "--ola", "ola.xlsx"]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_override_for_unconfigured_provider_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[[providers]]
name = "Uber"
path = "uber.csv"
"#,
        )
        .unwrap();

        let config_path = file.path().to_str().unwrap().to_string();
        let cli = CliConfig::parse_from(["fare-etl", "--config", &config_path, "--ola", "o.csv"]);
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_estimate_args() {
        let cli = CliConfig::parse_from([
            "fare-etl",
            "estimate",
            "--distance",
            "3",
            "--unit",
            "miles",
            "--time",
            "1",
            "--time-unit",
            "hours",
            "--surge",
            "1.5",
            "--verbose",
        ]);
        assert!(cli.verbose);

        let Command::Estimate(args) = cli.command() else {
            panic!("expected estimate command");
        };
        let trip = args.trip();
        assert_eq!(trip.distance_unit, DistanceUnit::Miles);
        assert_eq!(trip.duration_minutes(), 60.0);
        assert_eq!(trip.surge, 1.5);
        assert!(!args.from_analysis);
    }
}
