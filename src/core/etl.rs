use crate::core::{FareReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub report: FareReport,
    pub output_path: String,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&mut self) -> Result<EtlOutcome> {
        tracing::info!("Starting fare analysis");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("Extracting trip data...");
        let tables = self.pipeline.extract().await?;
        let rows: usize = tables.iter().map(|t| t.len()).sum();
        tracing::info!("Extracted {} rows from {} datasets", rows, tables.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("Cleaning and aggregating...");
        let report = self.pipeline.transform(tables).await?;
        tracing::info!("Aggregated {} providers", report.providers.len());
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("Rendering report...");
        let output_path = self.pipeline.load(&report).await?;
        tracing::info!("Report saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(EtlOutcome {
            report,
            output_path,
        })
    }
}
