use nzhp_core::{AppConfig, PriceEstimate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::ConsensusError;
use crate::sampling::{median, triangular, uniform};

pub const DEFAULT_DRAWS: usize = 10_000;

/// A midpoint filled in for a site that does not publish one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedMidpoint {
    pub site: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consensus {
    pub value: f64,
    pub sites_used: Vec<String>,
    /// Sites with no price at all.
    pub sites_excluded: Vec<String>,
    pub imputed_midpoints: Vec<ImputedMidpoint>,
    pub draws: usize,
}

/// Reduces per-site estimates to one consensus price.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusEngine {
    draws: usize,
    seed: Option<u64>,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DRAWS)
    }
}

impl ConsensusEngine {
    #[must_use]
    pub fn new(draws: usize) -> Self {
        Self {
            draws: draws.max(1),
            seed: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.simulation_draws)
    }

    /// Fixes the RNG seed so repeated runs give identical results.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Consensus value across `estimates`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::NoData`] when no estimate carries a price.
    pub fn estimate(&self, estimates: &[PriceEstimate]) -> Result<Consensus, ConsensusError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let imputed_midpoints = impute_midpoints(estimates);
        let mut sites_used = Vec::new();
        let mut sites_excluded = Vec::new();
        let mut samples: Vec<Vec<f64>> = Vec::new();

        for estimate in estimates {
            let midpoint = imputed_midpoints
                .iter()
                .find(|i| i.site == estimate.source)
                .map(|i| i.value)
                .or(estimate.midpoint);

            let mut values: Vec<f64> = [estimate.lower, midpoint, estimate.upper]
                .into_iter()
                .flatten()
                .collect();
            values.sort_by(f64::total_cmp);

            let draws = match values.as_slice() {
                [] => {
                    tracing::debug!(site = %estimate.source, "no prices, excluding site");
                    sites_excluded.push(estimate.source.clone());
                    continue;
                }
                [only] => vec![*only; self.draws],
                [low, high] => uniform(&mut rng, *low, *high, self.draws),
                [low, mode, high, ..] => triangular(&mut rng, *low, *mode, *high, self.draws),
            };
            sites_used.push(estimate.source.clone());
            samples.push(draws);
        }

        if samples.is_empty() {
            return Err(ConsensusError::NoData);
        }

        let aggregates: Vec<f64> = (0..self.draws)
            .filter_map(|i| {
                let column: Vec<f64> = samples.iter().map(|s| s[i]).collect();
                median(&column)
            })
            .collect();
        let value = median(&aggregates).ok_or(ConsensusError::NoData)?;

        tracing::info!(
            value,
            sites = sites_used.len(),
            excluded = sites_excluded.len(),
            draws = self.draws,
            "consensus computed"
        );

        Ok(Consensus {
            value,
            sites_used,
            sites_excluded,
            imputed_midpoints,
            draws: self.draws,
        })
    }
}

/// Midpoints for sites that never publish one but gave both bounds: the
/// mean of the other sites' midpoints clamped into the site's own range,
/// or the centre of that range when no other site has a midpoint.
fn impute_midpoints(estimates: &[PriceEstimate]) -> Vec<ImputedMidpoint> {
    estimates
        .iter()
        .filter(|e| !e.midpoint_published && e.midpoint.is_none())
        .filter_map(|e| {
            let (lower, upper) = (e.lower?, e.upper?);
            let (lower, upper) = if lower <= upper {
                (lower, upper)
            } else {
                (upper, lower)
            };

            let others: Vec<f64> = estimates
                .iter()
                .filter(|o| o.source != e.source)
                .filter_map(|o| o.midpoint)
                .collect();
            let value = if others.is_empty() {
                (lower + upper) / 2.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let mean = others.iter().sum::<f64>() / others.len() as f64;
                mean.clamp(lower, upper)
            };

            tracing::debug!(site = %e.source, value, "imputed unpublished midpoint");
            Some(ImputedMidpoint {
                site: e.source.clone(),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
