use crate::config::toml_config::FareConfig;
use crate::core::provider::clean_provider;
use crate::core::{FareReport, Pipeline, RawTable, Storage};
use crate::report::{
    render_bar_chart, render_console_summary, render_csv, render_json, render_text_chart,
    ChartOptions,
};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const CHART_FILENAME: &str = "fare_chart.svg";
pub const JSON_FILENAME: &str = "fare_summary.json";
pub const CSV_FILENAME: &str = "fare_summary.csv";

const TEXT_CHART_WIDTH: usize = 40;

/// Reads every configured provider, cleans each one and writes the report.
pub struct FarePipeline<S: Storage> {
    storage: S,
    config: FareConfig,
    text_chart: bool,
}

impl<S: Storage> FarePipeline<S> {
    pub fn new(storage: S, config: FareConfig) -> Self {
        Self {
            storage,
            config,
            text_chart: false,
        }
    }

    /// Also print a terminal bar chart during load.
    pub fn with_text_chart(mut self, enabled: bool) -> Self {
        self.text_chart = enabled;
        self
    }

    fn output_file(&self, filename: &str) -> String {
        let base = self.config.output_path().trim_end_matches('/');
        if base.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", base, filename)
        }
    }

    fn render_artifacts(&self, report: &FareReport) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut artifacts = Vec::new();
        for format in &self.config.report.output_formats {
            match format.as_str() {
                "svg" => {
                    let options = ChartOptions {
                        y_label: self.config.report.y_label.clone(),
                        ..ChartOptions::default()
                    };
                    artifacts.push((CHART_FILENAME, render_bar_chart(report, &options)?.into_bytes()));
                }
                "json" => artifacts.push((JSON_FILENAME, render_json(report)?.into_bytes())),
                "csv" => artifacts.push((CSV_FILENAME, render_csv(report)?.into_bytes())),
                other => {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "report.output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format".to_string(),
                    })
                }
            }
        }
        Ok(artifacts)
    }
}

fn bundle(artifacts: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in artifacts {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    // 完成並取回底層 Vec<u8>
    Ok(zip.finish()?.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for FarePipeline<S> {
    async fn extract(&self) -> Result<Vec<RawTable>> {
        let mut tables = Vec::with_capacity(self.config.providers.len());
        for provider in &self.config.providers {
            tracing::debug!("Reading {} trips from {}", provider.name, provider.path);
            let data = self.storage.read_file(&provider.path).await?;
            let table = RawTable::from_bytes(&provider.name, &data, provider.normalize_columns)?;
            tracing::info!("{}: loaded {} rows", provider.name, table.len());
            tables.push(table);
        }
        Ok(tables)
    }

    async fn transform(&self, tables: Vec<RawTable>) -> Result<FareReport> {
        if tables.len() != self.config.providers.len() {
            return Err(EtlError::ValidationError {
                message: format!(
                    "expected {} tables, got {}",
                    self.config.providers.len(),
                    tables.len()
                ),
            });
        }

        let mut providers = Vec::with_capacity(tables.len());
        for (table, provider) in tables.into_iter().zip(&self.config.providers) {
            let cleaned = clean_provider(table, provider)?;
            providers.push(cleaned.stats);
        }

        Ok(FareReport {
            title: self.config.report.title.clone(),
            currency_symbol: self.config.report.currency_symbol.clone(),
            generated_at: Utc::now(),
            providers,
        })
    }

    async fn load(&self, report: &FareReport) -> Result<String> {
        print!("{}", render_console_summary(report)?);
        if self.text_chart {
            println!();
            print!("{}", render_text_chart(report, TEXT_CHART_WIDTH)?);
        }

        let artifacts = self.render_artifacts(report)?;

        if let Some(compression) = self.config.compression() {
            let zip_data = bundle(&artifacts)?;
            let path = self.output_file(&compression.filename);
            tracing::debug!(
                "Writing {} files into {} ({} bytes)",
                artifacts.len(),
                path,
                zip_data.len()
            );
            self.storage.write_file(&path, &zip_data).await?;
            return Ok(path);
        }

        let mut primary = None;
        for (name, data) in &artifacts {
            let path = self.output_file(name);
            tracing::debug!("Writing {} ({} bytes)", path, data.len());
            self.storage.write_file(&path, data).await?;
            primary.get_or_insert(path);
        }

        primary.ok_or_else(|| EtlError::MissingConfigError {
            field: "report.output_formats".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::CompressionConfig;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const OLA: &str = "Booking ID,Fare,Distance\n1,\"₹1,000\",10\n2,₹500,5\n";
    const UBER: &str = "key,fare_amount,pickup_datetime,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude\n\
                        1,10,2015-05-07 19:52:06 UTC,0.0,0.0,0.01,0.0\n\
                        2,12,2015-05-08 10:00:00 UTC,0.0,0.0,0.01,0.0\n";
    const CAB: &str = "fare_amount,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude\n\
                       5,0.0,0.0,0.02,0.0\n\
                       nope,0.0,0.0,0.02,0.0\n";

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::default();
        storage.put("data/combined_sheets.csv", OLA).await;
        storage.put("data/uber.csv", UBER).await;
        storage.put("data/cab.csv", CAB).await;
        storage
    }

    fn config(output_formats: &[&str]) -> FareConfig {
        let mut config = FareConfig::default();
        config.report.output_path = "out".to_string();
        config.report.output_formats = output_formats.iter().map(|f| f.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn test_extract_reads_every_provider() {
        let pipeline = FarePipeline::new(seeded_storage().await, config(&["svg"]));
        let tables = pipeline.extract().await.unwrap();

        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].provider, "Ola");
        assert_eq!(tables[0].headers, vec!["booking_id", "fare", "distance"]);
        assert_eq!(tables[2].len(), 2);
    }

    #[tokio::test]
    async fn test_extract_missing_file_fails() {
        let storage = MockStorage::default();
        storage.put("data/combined_sheets.csv", OLA).await;
        let pipeline = FarePipeline::new(storage, config(&["svg"]));

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_builds_report_in_config_order() {
        let pipeline = FarePipeline::new(seeded_storage().await, config(&["svg"]));
        let tables = pipeline.extract().await.unwrap();
        let report = pipeline.transform(tables).await.unwrap();

        let names: Vec<&str> = report.providers.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(names, vec!["Ola", "Uber", "Namma Yatri"]);

        let ola = report.provider("Ola").unwrap();
        assert!((ola.fare_per_km - 100.0).abs() < 1e-9);

        let cab = report.provider("Namma Yatri").unwrap();
        assert_eq!(cab.trips_retained, 1);
        assert_eq!(cab.dropped.invalid_fare, 1);
        assert!((cab.fare_per_km - 5.0 * 83.0 / cab.mean_distance_km).abs() < 1e-9);

        let uber = report.provider("Uber").unwrap();
        assert!(uber.first_pickup < uber.last_pickup);

        for p in &report.providers {
            assert!(p.fare_per_km.is_finite() && p.fare_per_km >= 0.0);
        }
    }

    #[tokio::test]
    async fn test_transform_rejects_mismatched_tables() {
        let pipeline = FarePipeline::new(MockStorage::default(), config(&["svg"]));
        assert!(pipeline.transform(Vec::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_writes_each_format() {
        let storage = seeded_storage().await;
        let pipeline = FarePipeline::new(storage.clone(), config(&["svg", "json", "csv"]));
        let tables = pipeline.extract().await.unwrap();
        let report = pipeline.transform(tables).await.unwrap();

        let primary = pipeline.load(&report).await.unwrap();
        assert_eq!(primary, "out/fare_chart.svg");

        let svg = storage.get_file("out/fare_chart.svg").await.unwrap();
        assert!(String::from_utf8(svg).unwrap().contains("Namma Yatri"));
        assert!(storage.get_file("out/fare_summary.json").await.is_some());
        assert!(storage.get_file("out/fare_summary.csv").await.is_some());
    }

    #[tokio::test]
    async fn test_load_bundles_when_compression_enabled() {
        let storage = seeded_storage().await;
        let mut config = config(&["svg", "json"]);
        config.report.compression = Some(CompressionConfig {
            enabled: true,
            filename: "bundle.zip".to_string(),
        });
        let pipeline = FarePipeline::new(storage.clone(), config);
        let tables = pipeline.extract().await.unwrap();
        let report = pipeline.transform(tables).await.unwrap();

        let path = pipeline.load(&report).await.unwrap();
        assert_eq!(path, "out/bundle.zip");
        assert!(storage.get_file("out/fare_chart.svg").await.is_none());

        let zip_bytes = storage.get_file("out/bundle.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["fare_chart.svg", "fare_summary.json"]);
    }
}
