//! Checks for the guarantees the pricers and the random allocation engine make.
//! All comparisons take an absolute tolerance to absorb solver slack.

use crate::types::{Allocation, PriceVector, ProbabilityMatrix, ValuationMatrix};
use faer::{Mat, unzip, zip};

/// A pair `(agent, other)` where `agent` would gain `amount` by taking `other`'s outcome
#[derive(Debug, Clone, PartialEq)]
pub struct EnvyViolation {
    pub agent: usize,
    pub other: usize,
    pub amount: f64,
}

/// Total value the agents receive from an allocation
pub fn welfare(valuations: &ValuationMatrix, allocation: &Allocation) -> f64 {
    allocation.welfare(valuations)
}

/// Every ordered pair whose envy inequality fails by more than `tolerance`
pub fn envy_violations(
    valuations: &ValuationMatrix,
    allocation: &Allocation,
    prices: &PriceVector,
    tolerance: f64,
) -> Vec<EnvyViolation> {
    let n = allocation.len();
    let mut violations = Vec::new();

    for agent in 0..n {
        let own = allocation.resource_of(agent);
        let own_utility = valuations.value(agent, own) - prices.resource_price(own);
        for other in (0..n).filter(|&other| other != agent) {
            let theirs = allocation.resource_of(other);
            let swapped_utility = valuations.value(agent, theirs) - prices.resource_price(theirs);
            let amount = swapped_utility - own_utility;
            if amount > tolerance {
                violations.push(EnvyViolation {
                    agent,
                    other,
                    amount,
                });
            }
        }
    }

    violations
}

pub fn is_envy_free(
    valuations: &ValuationMatrix,
    allocation: &Allocation,
    prices: &PriceVector,
    tolerance: f64,
) -> bool {
    envy_violations(valuations, allocation, prices, tolerance).is_empty()
}

/// Prices add up to the rent
pub fn is_budget_balanced(prices: &PriceVector, rent: f64, tolerance: f64) -> bool {
    (prices.total() - rent).abs() <= tolerance
}

/// `EU[i] = sum_j v[i][j] * P[i][j]`. Panics if the two matrices differ in shape.
pub fn expected_utilities(
    valuations: &ValuationMatrix,
    probabilities: &ProbabilityMatrix,
) -> Vec<f64> {
    let n = probabilities.n_agents();
    let m = probabilities.n_resources();

    let mut weighted = Mat::<f64>::zeros(n, m);
    zip!(&mut weighted, valuations.mat(), probabilities.mat()).for_each(
        |unzip!(w, v, p)| {
            *w = v * p;
        },
    );

    (0..n)
        .map(|i| (0..m).map(|j| weighted[(i, j)]).sum())
        .collect()
}

/// Value `agent` assigns to running `other`'s lottery
pub fn lottery_value(
    valuations: &ValuationMatrix,
    probabilities: &ProbabilityMatrix,
    agent: usize,
    other: usize,
) -> f64 {
    (0..probabilities.n_resources())
        .map(|k| probabilities.probability(other, k) * valuations.value(agent, k))
        .sum()
}

/// Entries in `[0, 1]`, every row and every column summing to one
pub fn is_doubly_stochastic(probabilities: &ProbabilityMatrix, tolerance: f64) -> bool {
    let n = probabilities.n_agents();
    let m = probabilities.n_resources();

    let entries_ok = (0..n).all(|i| {
        (0..m).all(|j| {
            let p = probabilities.probability(i, j);
            p >= -tolerance && p <= 1.0 + tolerance
        })
    });
    let rows_ok = (0..n).all(|i| {
        let total: f64 = (0..m).map(|j| probabilities.probability(i, j)).sum();
        (total - 1.0).abs() <= tolerance
    });
    let cols_ok = (0..m).all(|j| {
        let total: f64 = (0..n).map(|i| probabilities.probability(i, j)).sum();
        (total - 1.0).abs() <= tolerance
    });

    entries_ok && rows_ok && cols_ok
}

/// No agent values another agent's lottery above its own
pub fn is_envy_free_in_expectation(
    valuations: &ValuationMatrix,
    probabilities: &ProbabilityMatrix,
    tolerance: f64,
) -> bool {
    let utilities = expected_utilities(valuations, probabilities);
    let n = probabilities.n_agents();

    (0..n).all(|agent| {
        (0..n).filter(|&other| other != agent).all(|other| {
            lottery_value(valuations, probabilities, agent, other) <= utilities[agent] + tolerance
        })
    })
}
