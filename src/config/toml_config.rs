use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_range,
    validate_unique_names, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

pub const VALID_OUTPUT_FORMATS: [&str; 3] = ["svg", "json", "csv"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_tariffs")]
    pub tariffs: Vec<TariffConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    #[serde(default = "default_bundle_filename")]
    pub filename: String,
}

/// How a provider's trip length is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DistanceSource {
    /// The export already carries a distance per trip.
    Column {
        #[serde(default = "default_distance_column")]
        column: String,
    },
    /// Computed from pickup and dropoff coordinates.
    Haversine {
        #[serde(default = "default_pickup_lat")]
        pickup_lat: String,
        #[serde(default = "default_pickup_lon")]
        pickup_lon: String,
        #[serde(default = "default_dropoff_lat")]
        dropoff_lat: String,
        #[serde(default = "default_dropoff_lon")]
        dropoff_lon: String,
    },
}

impl DistanceSource {
    pub fn haversine() -> Self {
        DistanceSource::Haversine {
            pickup_lat: default_pickup_lat(),
            pickup_lon: default_pickup_lon(),
            dropoff_lat: default_dropoff_lat(),
            dropoff_lon: default_dropoff_lon(),
        }
    }

    pub fn column(column: &str) -> Self {
        DistanceSource::Column {
            column: column.to_string(),
        }
    }
}

impl Default for DistanceSource {
    fn default() -> Self {
        Self::haversine()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub path: String,
    #[serde(default = "default_fare_column")]
    pub fare_column: String,
    #[serde(default)]
    pub distance: DistanceSource,
    pub datetime_column: Option<String>,
    /// Multiplier from the dataset's currency into the report currency.
    #[serde(default = "default_conversion_rate")]
    pub conversion_rate: f64,
    pub zscore_threshold: Option<f64>,
    /// Forward/back-fill blank cells before coordinates are read.
    #[serde(default)]
    pub fill_missing: bool,
    #[serde(default = "default_true")]
    pub normalize_columns: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffConfig {
    pub provider: String,
    pub base_fare: f64,
    pub per_km: f64,
    pub per_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_title() -> String {
    "Cost Price Analysis: Ola vs Namma Yatri vs Uber".to_string()
}

fn default_y_label() -> String {
    "Average Fare per Km (₹)".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_output_formats() -> Vec<String> {
    vec!["svg".to_string(), "json".to_string()]
}

fn default_bundle_filename() -> String {
    "fare_report.zip".to_string()
}

fn default_fare_column() -> String {
    "fare_amount".to_string()
}

fn default_distance_column() -> String {
    "distance".to_string()
}

fn default_pickup_lat() -> String {
    "pickup_latitude".to_string()
}

fn default_pickup_lon() -> String {
    "pickup_longitude".to_string()
}

fn default_dropoff_lat() -> String {
    "dropoff_latitude".to_string()
}

fn default_dropoff_lon() -> String {
    "dropoff_longitude".to_string()
}

fn default_conversion_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_color() -> String {
    "steelblue".to_string()
}

/// USD -> INR rate the Uber and Namma Yatri exports are converted with.
pub const USD_TO_INR: f64 = 83.0;

pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "Ola".to_string(),
            path: "data/combined_sheets.csv".to_string(),
            fare_column: "fare".to_string(),
            distance: DistanceSource::column("distance"),
            datetime_column: None,
            conversion_rate: 1.0,
            zscore_threshold: None,
            fill_missing: false,
            normalize_columns: true,
            color: "skyblue".to_string(),
        },
        ProviderConfig {
            name: "Uber".to_string(),
            path: "data/uber.csv".to_string(),
            fare_column: default_fare_column(),
            distance: DistanceSource::haversine(),
            datetime_column: Some("pickup_datetime".to_string()),
            conversion_rate: USD_TO_INR,
            zscore_threshold: Some(3.0),
            fill_missing: true,
            normalize_columns: true,
            color: "orange".to_string(),
        },
        ProviderConfig {
            name: "Namma Yatri".to_string(),
            path: "data/cab.csv".to_string(),
            fare_column: default_fare_column(),
            distance: DistanceSource::haversine(),
            datetime_column: None,
            conversion_rate: USD_TO_INR,
            zscore_threshold: Some(3.0),
            fill_missing: false,
            normalize_columns: true,
            color: "lightgreen".to_string(),
        },
    ]
}

pub fn default_tariffs() -> Vec<TariffConfig> {
    vec![
        TariffConfig {
            provider: "Ola".to_string(),
            base_fare: 20.0,
            per_km: 58.76,
            per_min: 2.0,
        },
        TariffConfig {
            provider: "Uber".to_string(),
            base_fare: 25.0,
            per_km: 41.22,
            per_min: 1.5,
        },
        TariffConfig {
            provider: "Namma Yatri".to_string(),
            base_fare: 20.0,
            per_km: 53.11,
            per_min: 1.0,
        },
    ]
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            y_label: default_y_label(),
            currency_symbol: default_currency_symbol(),
            output_path: default_output_path(),
            output_formats: default_output_formats(),
            compression: None,
        }
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            report: ReportConfig::default(),
            providers: default_providers(),
            tariffs: default_tariffs(),
            monitoring: None,
        }
    }
}

impl FareConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn output_path(&self) -> &str {
        &self.report.output_path
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn compression(&self) -> Option<&CompressionConfig> {
        self.report.compression.as_ref().filter(|c| c.enabled)
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn tariff(&self, provider: &str) -> Option<&TariffConfig> {
        self.tariffs
            .iter()
            .find(|t| t.provider.eq_ignore_ascii_case(provider))
    }

    /// Points a configured provider at a different input file.
    pub fn set_provider_path(&mut self, name: &str, path: &str) -> Result<()> {
        let provider = self
            .providers
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "providers.name".to_string(),
                value: name.to_string(),
                reason: "No provider with this name is configured".to_string(),
            })?;
        provider.path = path.to_string();
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "providers".to_string(),
            });
        }

        validate_unique_names(
            "providers.name",
            self.providers.iter().map(|p| p.name.as_str()),
        )?;

        for provider in &self.providers {
            provider.validate()?;
        }

        let paths: Vec<&str> = self.providers.iter().map(|p| p.path.as_str()).collect();
        validate_file_extensions("providers.path", &paths, &["csv"])?;

        validate_path("report.output_path", &self.report.output_path)?;

        if self.report.output_formats.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "report.output_formats".to_string(),
            });
        }
        for format in &self.report.output_formats {
            if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "report.output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        VALID_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }

        if let Some(compression) = self.compression() {
            validate_file_extensions(
                "report.compression.filename",
                &[compression.filename.as_str()],
                &["zip"],
            )?;
        }

        for tariff in &self.tariffs {
            validate_non_empty_string("tariffs.provider", &tariff.provider)?;
            validate_range("tariffs.base_fare", tariff.base_fare, 0.0, f64::MAX)?;
            validate_range("tariffs.per_km", tariff.per_km, 0.0, f64::MAX)?;
            validate_range("tariffs.per_min", tariff.per_min, 0.0, f64::MAX)?;
        }

        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("providers.name", &self.name)?;
        validate_path("providers.path", &self.path)?;
        validate_non_empty_string("providers.fare_column", &self.fare_column)?;

        match &self.distance {
            DistanceSource::Column { column } => {
                validate_non_empty_string("providers.distance.column", column)?;
            }
            DistanceSource::Haversine {
                pickup_lat,
                pickup_lon,
                dropoff_lat,
                dropoff_lon,
            } => {
                for column in [pickup_lat, pickup_lon, dropoff_lat, dropoff_lon] {
                    validate_non_empty_string("providers.distance", column)?;
                }
            }
        }

        if self.conversion_rate <= 0.0 || !self.conversion_rate.is_finite() {
            return Err(EtlError::InvalidConfigValueError {
                field: "providers.conversion_rate".to_string(),
                value: self.conversion_rate.to_string(),
                reason: "Conversion rate must be a positive number".to_string(),
            });
        }

        if let Some(threshold) = self.zscore_threshold {
            if threshold <= 0.0 || !threshold.is_finite() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "providers.zscore_threshold".to_string(),
                    value: threshold.to_string(),
                    reason: "Threshold must be a positive number".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for FareConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
