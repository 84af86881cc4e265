//! Envy-graph pricing.
//!
//! For a fixed allocation, edge `i -> j` carries how much agent i would gain by
//! swapping into j's resource at equal prices. Each agent is granted the weight
//! of the heaviest envy path leaving it, and all prices are then shifted by the
//! same constant so that they add up to the rent. A uniform shift leaves every
//! pairwise comparison unchanged, so envy-freeness survives budget balancing.

use crate::{
    error::{AllocationError, Result},
    solver::SolverConfig,
    types::{Allocation, PriceVector, ValuationMatrix},
    validation::{check_allocation, check_pricing_inputs, check_square},
};
use faer::Mat;
use log::{debug, trace};
use rayon::prelude::*;

/// Complete directed graph over agents weighted by pairwise envy
#[derive(Debug, Clone)]
pub struct EnvyGraph {
    // envy[(i, j)] = v[i][alloc[j]] - v[i][alloc[i]]
    envy: Mat<f64>,
    cycle_tolerance: f64,
}

impl EnvyGraph {
    /// Build the envy graph of an allocation. `tolerance` is scaled by the
    /// largest valuation before being used to detect positive cycles.
    pub fn new(
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        tolerance: f64,
    ) -> Result<Self> {
        check_square(valuations)?;
        check_allocation(valuations, allocation)?;

        let n = valuations.n_agents();
        let envy = Mat::from_fn(n, n, |i, j| {
            valuations.value(i, allocation.resource_of(j))
                - valuations.value(i, allocation.resource_of(i))
        });

        Ok(Self {
            envy,
            cycle_tolerance: tolerance * valuations.magnitude().max(1.0),
        })
    }

    pub fn n_agents(&self) -> usize {
        self.envy.nrows()
    }

    /// How much `from` envies `to`'s bundle at equal prices
    pub fn envy(&self, from: usize, to: usize) -> f64 {
        self.envy[(from, to)]
    }

    /// Heaviest total envy along any path from `source` to every agent.
    ///
    /// Bellman-Ford on edge weights `-envy`; the returned vector is `-dist`.
    /// Fails if some cycle reachable from `source` has positive total envy.
    pub fn heaviest_paths_from(&self, source: usize) -> Result<Vec<f64>> {
        let n = self.n_agents();
        let mut dist = vec![f64::INFINITY; n];
        dist[source] = 0.0;

        for _ in 1..n {
            let mut changed = false;
            for u in 0..n {
                if !dist[u].is_finite() {
                    continue;
                }
                for v in 0..n {
                    if u == v {
                        continue;
                    }
                    let candidate = dist[u] - self.envy[(u, v)];
                    if candidate < dist[v] {
                        dist[v] = candidate;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // One more pass: any further improvement means a negative cycle in -envy
        for u in 0..n {
            for v in 0..n {
                if u != v && dist[u] - self.envy[(u, v)] < dist[v] - self.cycle_tolerance {
                    return Err(AllocationError::PositiveEnvyCycle { agent: source });
                }
            }
        }

        Ok(dist.into_iter().map(|d| -d).collect())
    }

    /// Grant per agent: the largest transitive envy it can reach, never below zero
    pub fn grants(&self) -> Result<Vec<f64>> {
        (0..self.n_agents())
            .into_par_iter()
            .map(|agent| {
                let heaviest = self.heaviest_paths_from(agent)?;
                trace!("For agent {agent} the heaviest envy paths are {heaviest:?}");
                // heaviest[agent] == 0, so the grant is at least zero
                Ok(heaviest.into_iter().fold(0.0, f64::max))
            })
            .collect()
    }

    /// Fail fast if the allocation admits no envy-free pricing at all
    pub fn check_no_positive_cycle(&self) -> Result<()> {
        // Every agent is reachable from agent 0 in a complete graph
        if self.n_agents() > 0 {
            self.heaviest_paths_from(0)?;
        }
        Ok(())
    }
}

/// Prices an allocation through its envy graph
#[derive(Debug, Clone, Default)]
pub struct EnvyGraphPricer {
    config: SolverConfig,
}

impl EnvyGraphPricer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Envy-free prices summing to `rent` for a fixed allocation
    pub fn price(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
    ) -> Result<PriceVector> {
        check_pricing_inputs(valuations, allocation, rent)?;

        let graph = EnvyGraph::new(valuations, allocation, self.config.tolerance)?;
        let grants = graph.grants()?;
        debug!("Envy grants per agent: {grants:?}");

        let n = grants.len();
        let total_grants: f64 = grants.iter().sum();
        let price_for_all = (total_grants + rent) / n as f64;

        let mut prices = vec![0.0; n];
        for (agent, grant) in grants.iter().enumerate() {
            prices[allocation.resource_of(agent)] = price_for_all - grant;
        }
        debug!("Final envy-graph pricing by resource: {prices:?}");

        Ok(PriceVector::new(prices))
    }
}
