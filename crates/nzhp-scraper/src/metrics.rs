//! Batch summary statistics over scraping results.

use std::collections::BTreeMap;

use nzhp_core::ScrapingResult;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapingMetrics {
    pub total_sites: usize,
    pub successful_sites: usize,
    pub failed_sites: usize,
    /// Sum of per-site execution times, in seconds.
    pub total_execution_time: f64,
    pub average_time_per_site: f64,
    /// `"<price_point>:<strategy_type>"` entry to number of uses.
    pub extraction_methods_used: BTreeMap<String, usize>,
    /// Error category (text before the first `:`) to number of occurrences.
    pub error_summary: BTreeMap<String, usize>,
    /// Percentage of successful sites, 0-100.
    pub success_rate: f64,
}

/// Aggregates a batch of results. An empty batch yields all-zero metrics.
#[must_use]
pub fn calculate_metrics(results: &[ScrapingResult]) -> ScrapingMetrics {
    let total_sites = results.len();
    if total_sites == 0 {
        return ScrapingMetrics::default();
    }

    let successful_sites = results.iter().filter(|r| r.success).count();
    let total_execution_time: f64 = results.iter().map(|r| r.execution_time).sum();

    let mut extraction_methods_used = BTreeMap::new();
    let mut error_summary = BTreeMap::new();
    for result in results {
        result
            .extraction_method
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != "none")
            .for_each(|m| *extraction_methods_used.entry(m.to_string()).or_insert(0) += 1);

        for error in &result.errors {
            let category = error.split(':').next().unwrap_or_default().trim();
            *error_summary.entry(category.to_string()).or_insert(0) += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let (count, successes) = (total_sites as f64, successful_sites as f64);

    ScrapingMetrics {
        total_sites,
        successful_sites,
        failed_sites: total_sites - successful_sites,
        total_execution_time,
        average_time_per_site: total_execution_time / count,
        extraction_methods_used,
        error_summary,
        success_rate: successes / count * 100.0,
    }
}
