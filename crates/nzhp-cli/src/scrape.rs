//! `scrape` command: run the batch pipeline over the targets file and
//! aggregate whatever succeeded.
//!
//! Per-site failures are part of the report, never a process error. The
//! run fails on configuration problems, and after printing the report when
//! no site produced a usable price.

use std::path::PathBuf;

use nzhp_consensus::ConsensusEngine;
use nzhp_core::{AppConfig, PriceEstimate};
use nzhp_scraper::{calculate_metrics, Pipeline};

#[derive(Debug, Clone, Default)]
pub(crate) struct ScrapeArgs {
    pub(crate) targets: Option<PathBuf>,
    pub(crate) parallel: Option<usize>,
    pub(crate) budget_secs: Option<u64>,
    pub(crate) validate: bool,
    pub(crate) seed: Option<u64>,
}

impl ScrapeArgs {
    /// `config` with command-line flags layered on top.
    pub(crate) fn apply(&self, config: &AppConfig) -> AppConfig {
        let mut config = config.clone();
        if let Some(path) = &self.targets {
            config.targets_path.clone_from(path);
        }
        if let Some(parallel) = self.parallel {
            config.max_concurrent_sites = parallel.max(1);
        }
        if self.budget_secs.is_some() {
            config.batch_budget_secs = self.budget_secs;
        }
        if self.validate {
            config.validate_prices = true;
        }
        config
    }
}

/// Scrape every target, then print results, metrics and the consensus.
///
/// # Errors
///
/// Returns an error if the targets file or selector table cannot be loaded,
/// the report cannot be serialized, or no consensus could be formed.
pub(crate) async fn run_scrape(config: &AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    let config = args.apply(config);
    let run_id = uuid::Uuid::new_v4();
    let started_at = chrono::Utc::now();

    let targets_file = nzhp_core::load_targets(&config.targets_path)?;
    let targets = targets_file.targets();
    let pipeline = Pipeline::from_config(&config)?.with_search_urls(targets_file.search_urls());

    tracing::info!(
        %run_id,
        targets = targets.len(),
        max_concurrent = config.max_concurrent_sites,
        "scrape run started"
    );
    let results = pipeline.run(&targets).await;
    let metrics = calculate_metrics(&results);

    let estimates: Vec<PriceEstimate> = results
        .iter()
        .filter_map(PriceEstimate::from_scraping_result)
        .collect();
    let mut engine = ConsensusEngine::from_config(&config);
    if let Some(seed) = args.seed {
        engine = engine.with_seed(seed);
    }
    let outcome = engine.estimate(&estimates);
    if let Err(e) = &outcome {
        tracing::warn!(error = %e, "no consensus for this run");
    }

    tracing::info!(
        %run_id,
        successful = metrics.successful_sites,
        failed = metrics.failed_sites,
        success_rate = metrics.success_rate,
        "scrape run finished"
    );

    let report = serde_json::json!({
        "run_id": run_id,
        "started_at": started_at,
        "results": results,
        "metrics": metrics,
        "consensus": outcome.as_ref().ok(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    outcome?;
    Ok(())
}
