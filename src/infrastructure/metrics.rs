//! Metrics collection
//!
//! Provides metrics for build executions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::orchestrator::BuildReport;

/// Metrics for one build execution
#[derive(Debug, Clone)]
pub struct BuildMetrics {
    /// Plan label the build ran under
    pub plan_name: String,

    /// Total execution duration
    pub duration: Duration,

    /// Number of artifacts retrieved
    pub artifact_count: usize,
}

impl BuildMetrics {
    /// Derives metrics from a finished build report.
    #[must_use]
    pub fn from_report(report: &BuildReport) -> Self {
        Self {
            plan_name: report.plan_name.clone(),
            duration: report.duration,
            artifact_count: report.artifacts.len(),
        }
    }
}

/// Metrics collector for build executions
pub struct MetricsCollector {
    /// Collected metrics
    metrics: Arc<RwLock<HashMap<String, BuildMetrics>>>,
}

impl MetricsCollector {
    /// Creates a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records metrics for a build execution
    #[allow(clippy::missing_panics_doc)]
    pub fn record(&self, metrics: BuildMetrics) {
        let mut metrics_map = self.metrics.write().unwrap();
        metrics_map.insert(metrics.plan_name.clone(), metrics);
    }

    /// Gets metrics for a specific plan
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn get(&self, plan_name: &str) -> Option<BuildMetrics> {
        let metrics_map = self.metrics.read().unwrap();
        metrics_map.get(plan_name).cloned()
    }

    /// Gets all recorded metrics
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn get_all(&self) -> Vec<BuildMetrics> {
        let metrics_map = self.metrics.read().unwrap();
        metrics_map.values().cloned().collect()
    }

    /// Total wall-clock spent across all recorded builds
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.get_all().iter().map(|m| m.duration).sum()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
