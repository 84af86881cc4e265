use crate::error::{AllocationError, Result};
use faer::{Mat, MatRef};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense agent-by-resource valuation matrix; `value(i, j)` is agent i's value for resource j.
#[derive(Debug, Clone)]
pub struct ValuationMatrix {
    values: Mat<f64>,
}

impl ValuationMatrix {
    /// Build from row-major data, one row per agent
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_agents = rows.len();
        let n_resources = rows.first().map_or(0, Vec::len);
        if n_agents == 0 || n_resources == 0 {
            return Err(AllocationError::EmptyValuations);
        }

        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_resources {
                return Err(AllocationError::RaggedValuations {
                    row,
                    expected: n_resources,
                    found: values.len(),
                });
            }
        }

        Self::from_mat(Mat::from_fn(n_agents, n_resources, |i, j| rows[i][j]))
    }

    /// Wrap an existing faer matrix after checking every entry is finite
    pub fn from_mat(values: Mat<f64>) -> Result<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(AllocationError::EmptyValuations);
        }
        for agent in 0..values.nrows() {
            for resource in 0..values.ncols() {
                let value = values[(agent, resource)];
                if !value.is_finite() {
                    return Err(AllocationError::NonFiniteValuation {
                        agent,
                        resource,
                        value,
                    });
                }
            }
        }
        Ok(Self { values })
    }

    pub fn n_agents(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_resources(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.n_agents() == self.n_resources()
    }

    /// Agent's value for a resource
    pub fn value(&self, agent: usize, resource: usize) -> f64 {
        self.values[(agent, resource)]
    }

    /// Largest absolute value, used to scale numeric tolerances
    pub fn magnitude(&self) -> f64 {
        let mut largest: f64 = 0.0;
        for i in 0..self.n_agents() {
            for j in 0..self.n_resources() {
                largest = largest.max(self.values[(i, j)].abs());
            }
        }
        largest
    }

    pub fn as_mat(&self) -> MatRef<'_, f64> {
        self.values.as_ref()
    }

    pub(crate) fn mat(&self) -> &Mat<f64> {
        &self.values
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_agents())
            .map(|i| (0..self.n_resources()).map(|j| self.value(i, j)).collect())
            .collect()
    }
}

/// One-to-one assignment of agents to resources
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    // index i gives the resource held by agent i
    agent_to_resource: Vec<usize>,
    // index j gives the agent holding resource j
    resource_to_agent: Vec<usize>,
}

impl Allocation {
    /// Create from `agent -> resource`, checking that it is a permutation
    pub fn new(agent_to_resource: Vec<usize>) -> Result<Self> {
        let n = agent_to_resource.len();
        if n == 0 {
            return Err(AllocationError::InvalidAllocation(
                "allocation is empty".to_string(),
            ));
        }

        let mut resource_to_agent = vec![usize::MAX; n];
        for (agent, &resource) in agent_to_resource.iter().enumerate() {
            if resource >= n {
                return Err(AllocationError::InvalidAllocation(format!(
                    "agent {agent} holds resource {resource}, but there are only {n} resources"
                )));
            }
            if resource_to_agent[resource] != usize::MAX {
                return Err(AllocationError::InvalidAllocation(format!(
                    "resource {resource} is assigned to both agent {} and agent {agent}",
                    resource_to_agent[resource]
                )));
            }
            resource_to_agent[resource] = agent;
        }

        Ok(Self {
            agent_to_resource,
            resource_to_agent,
        })
    }

    pub fn len(&self) -> usize {
        self.agent_to_resource.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agent_to_resource.is_empty()
    }

    pub fn resource_of(&self, agent: usize) -> usize {
        self.agent_to_resource[agent]
    }

    pub fn agent_of(&self, resource: usize) -> usize {
        self.resource_to_agent[resource]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.agent_to_resource
    }

    /// Iterate `(agent, resource)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.agent_to_resource.iter().copied().enumerate()
    }

    /// Total value the agents obtain from their own resources
    pub fn welfare(&self, valuations: &ValuationMatrix) -> f64 {
        self.iter()
            .map(|(agent, resource)| valuations.value(agent, resource))
            .sum()
    }
}

/// Prices indexed by resource
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceVector {
    prices: Vec<f64>,
}

impl PriceVector {
    pub fn new(prices: Vec<f64>) -> Self {
        Self { prices }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn resource_price(&self, resource: usize) -> f64 {
        self.prices[resource]
    }

    /// What an agent pays under the given allocation
    pub fn agent_price(&self, allocation: &Allocation, agent: usize) -> f64 {
        self.prices[allocation.resource_of(agent)]
    }

    pub fn total(&self) -> f64 {
        self.prices.iter().sum()
    }

    pub fn min_price(&self) -> f64 {
        self.prices.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }
}

/// Result of an LP pricing variant. Infeasibility is an ordinary outcome.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PricingOutcome {
    Priced(PriceVector),
    /// No envy-free, budget-balanced pricing has every price >= 0
    NoNonnegativePricing,
    /// The best achievable minimum price is not strictly positive
    NoPositivePricing { best_minimum_price: f64 },
}

impl PricingOutcome {
    pub fn prices(&self) -> Option<&PriceVector> {
        match self {
            PricingOutcome::Priced(prices) => Some(prices),
            _ => None,
        }
    }

    pub fn into_prices(self) -> Option<PriceVector> {
        match self {
            PricingOutcome::Priced(prices) => Some(prices),
            _ => None,
        }
    }

    pub fn is_priced(&self) -> bool {
        matches!(self, PricingOutcome::Priced(_))
    }
}

/// Fractional assignment: entry (i, j) is the probability agent i receives resource j
#[derive(Debug, Clone)]
pub struct ProbabilityMatrix {
    probabilities: Mat<f64>,
}

impl ProbabilityMatrix {
    pub(crate) fn from_mat(probabilities: Mat<f64>) -> Self {
        Self { probabilities }
    }

    /// Build from row-major data without checking stochasticity
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_agents = rows.len();
        let n_resources = rows.first().map_or(0, Vec::len);
        if n_agents == 0 || n_resources == 0 {
            return Err(AllocationError::EmptyValuations);
        }
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != n_resources)
        {
            return Err(AllocationError::RaggedValuations {
                row,
                expected: n_resources,
                found: values.len(),
            });
        }
        Ok(Self::from_mat(Mat::from_fn(n_agents, n_resources, |i, j| {
            rows[i][j]
        })))
    }

    pub fn n_agents(&self) -> usize {
        self.probabilities.nrows()
    }

    pub fn n_resources(&self) -> usize {
        self.probabilities.ncols()
    }

    pub fn probability(&self, agent: usize, resource: usize) -> f64 {
        self.probabilities[(agent, resource)]
    }

    pub fn as_mat(&self) -> MatRef<'_, f64> {
        self.probabilities.as_ref()
    }

    pub(crate) fn mat(&self) -> &Mat<f64> {
        &self.probabilities
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_agents())
            .map(|i| {
                (0..self.n_resources())
                    .map(|j| self.probability(i, j))
                    .collect()
            })
            .collect()
    }
}
