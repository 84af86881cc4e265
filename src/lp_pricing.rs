use crate::{
    envy_graph::EnvyGraph,
    error::{AllocationError, Result},
    lp_builder::{LpBuilder, LpPrimitives},
    solver::{LpStatus, SolverConfig, solve_lp},
    types::{Allocation, PriceVector, PricingOutcome, ValuationMatrix},
    validation::check_pricing_inputs,
};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which pricing program to solve on top of the shared envy-free, budget-balanced constraints
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpObjective {
    /// Any feasible price vector
    #[default]
    Feasibility,
    /// Every price must be >= 0
    Nonnegative,
    /// Maximize the smallest price; report when it cannot be made positive
    MaximizeMinimum,
}

/// Prices a fixed allocation by linear programming.
///
/// Variable `k` is the price of resource `k`. For every ordered pair of agents
/// `(i, j)` holding `a_i` and `a_j`:
///
/// ```text
/// v[i][a_i] - p[a_i] >= v[i][a_j] - p[a_j]
/// ```
///
/// and the prices add up to the rent.
#[derive(Debug, Clone, Default)]
pub struct LpPricer {
    config: SolverConfig,
}

impl LpPricer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the program selected by `objective`
    pub fn price(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
        objective: LpObjective,
    ) -> Result<PricingOutcome> {
        match objective {
            LpObjective::Feasibility => self
                .price_feasible(valuations, allocation, rent)
                .map(PricingOutcome::Priced),
            LpObjective::Nonnegative => self.price_nonnegative(valuations, allocation, rent),
            LpObjective::MaximizeMinimum => self.price_max_min(valuations, allocation, rent),
        }
    }

    /// Any envy-free, budget-balanced price vector
    pub fn price_feasible(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
    ) -> Result<PriceVector> {
        self.check_inputs(valuations, allocation, rent)?;

        let primitives =
            build_pricing_program(valuations, allocation, rent, LpObjective::Feasibility)?;
        let solution = solve_lp(&primitives, &self.config)?;

        match solution.status {
            LpStatus::Optimal => {
                let prices = PriceVector::new(solution.x[..allocation.len()].to_vec());
                debug!("Feasible LP pricing: {:?}", prices.as_slice());
                Ok(prices)
            }
            status => Err(AllocationError::LpSolver(format!(
                "envy-free pricing program ended with status {status:?}"
            ))),
        }
    }

    /// Envy-free, budget-balanced prices that are all nonnegative, if any exist
    pub fn price_nonnegative(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
    ) -> Result<PricingOutcome> {
        self.check_inputs(valuations, allocation, rent)?;

        let primitives =
            build_pricing_program(valuations, allocation, rent, LpObjective::Nonnegative)?;
        let solution = solve_lp(&primitives, &self.config)?;

        match solution.status {
            LpStatus::Optimal => {
                let prices = PriceVector::new(solution.x[..allocation.len()].to_vec());
                debug!("Nonnegative LP pricing: {:?}", prices.as_slice());
                Ok(PricingOutcome::Priced(prices))
            }
            LpStatus::Infeasible => {
                debug!("Pricing such that all prices >= 0 doesn't exist");
                Ok(PricingOutcome::NoNonnegativePricing)
            }
            LpStatus::Unbounded => Err(AllocationError::LpSolver(
                "nonnegative pricing program reported unbounded".to_string(),
            )),
        }
    }

    /// Envy-free, budget-balanced prices maximizing the smallest price.
    ///
    /// Returns [`PricingOutcome::NoPositivePricing`] when the optimum minimum
    /// price is not above the configured tolerance.
    pub fn price_max_min(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
    ) -> Result<PricingOutcome> {
        self.check_inputs(valuations, allocation, rent)?;

        let n = allocation.len();
        let primitives =
            build_pricing_program(valuations, allocation, rent, LpObjective::MaximizeMinimum)?;
        let solution = solve_lp(&primitives, &self.config)?;

        if solution.status != LpStatus::Optimal {
            return Err(AllocationError::LpSolver(format!(
                "max-min pricing program ended with status {:?}",
                solution.status
            )));
        }

        let z = solution.x[n];
        debug!("Z optimal value: {z}");

        let slack = self.config.tolerance * valuations.magnitude().max(rent.abs()).max(1.0);
        if z <= slack {
            debug!("Pricing such that all prices > 0 doesn't exist");
            return Ok(PricingOutcome::NoPositivePricing {
                best_minimum_price: z,
            });
        }

        Ok(PricingOutcome::Priced(PriceVector::new(
            solution.x[..n].to_vec(),
        )))
    }

    fn check_inputs(
        &self,
        valuations: &ValuationMatrix,
        allocation: &Allocation,
        rent: f64,
    ) -> Result<()> {
        check_pricing_inputs(valuations, allocation, rent)?;
        // Without this, a non-optimal allocation would look like "no nonnegative pricing"
        EnvyGraph::new(valuations, allocation, self.config.tolerance)?.check_no_positive_cycle()
    }
}

/// Build the pricing LP. Variables `0..n` are resource prices; `MaximizeMinimum`
/// adds the minimum-price variable `z` at index `n`.
pub(crate) fn build_pricing_program(
    valuations: &ValuationMatrix,
    allocation: &Allocation,
    rent: f64,
    objective: LpObjective,
) -> Result<LpPrimitives> {
    let n = allocation.len();
    let n_vars = match objective {
        LpObjective::MaximizeMinimum => n + 1,
        LpObjective::Feasibility | LpObjective::Nonnegative => n,
    };
    let mut lp = LpBuilder::new(n_vars);

    // Budget balance
    let all_prices: Vec<(usize, f64)> = (0..n).map(|k| (k, 1.0)).collect();
    lp.add_eq(&all_prices, rent)?;

    // Envy-freeness: p[a_i] - p[a_j] <= v[i][a_i] - v[i][a_j]
    for i in 0..n {
        let own = allocation.resource_of(i);
        for j in (0..n).filter(|&j| j != i) {
            let theirs = allocation.resource_of(j);
            lp.add_le(
                &[(own, 1.0), (theirs, -1.0)],
                valuations.value(i, own) - valuations.value(i, theirs),
            )?;
        }
    }

    match objective {
        LpObjective::Feasibility => {}
        LpObjective::Nonnegative => {
            for k in 0..n {
                lp.add_ge(&[(k, 1.0)], 0.0)?;
            }
        }
        LpObjective::MaximizeMinimum => {
            // z <= p[k] for every resource; minimize -z
            for k in 0..n {
                lp.add_le(&[(n, 1.0), (k, -1.0)], 0.0)?;
            }
            lp.set_cost(n, -1.0)?;
        }
    }

    lp.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fairness::{is_budget_balanced, is_envy_free};

    const TOL: f64 = 1e-5;

    fn instance(rows: &[Vec<f64>]) -> (ValuationMatrix, Allocation) {
        let v = ValuationMatrix::from_rows(rows).unwrap();
        let alloc = crate::matching::compute_allocation(&v).unwrap();
        (v, alloc)
    }

    #[test]
    fn test_program_shape() {
        let (v, alloc) = instance(&[vec![150.0, 0.0], vec![140.0, 10.0]]);

        let feasible = build_pricing_program(&v, &alloc, 130.0, LpObjective::Feasibility).unwrap();
        assert_eq!(feasible.n_vars(), 2);
        assert_eq!(feasible.b_eq, vec![130.0]);
        // One inequality per ordered pair
        assert_eq!(feasible.b_ub, vec![150.0, -130.0]);

        let nonneg = build_pricing_program(&v, &alloc, 130.0, LpObjective::Nonnegative).unwrap();
        assert_eq!(nonneg.b_ub.len(), 4);

        let max_min =
            build_pricing_program(&v, &alloc, 130.0, LpObjective::MaximizeMinimum).unwrap();
        assert_eq!(max_min.n_vars(), 3);
        assert_eq!(max_min.b_ub.len(), 4);
        assert_eq!(max_min.cost, vec![0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_feasible_pricing() {
        let (v, alloc) = instance(&[vec![150.0, 0.0], vec![140.0, 10.0]]);
        let prices = LpPricer::default().price_feasible(&v, &alloc, 130.0).unwrap();

        assert!(is_budget_balanced(&prices, 130.0, TOL));
        assert!(is_envy_free(&v, &alloc, &prices, TOL));
        let p0 = prices.agent_price(&alloc, 0);
        assert!((130.0 - TOL..=140.0 + TOL).contains(&p0));
    }

    #[test]
    fn test_identical_agents() {
        let (v, alloc) = instance(&[vec![10.0, 10.0], vec![10.0, 10.0]]);
        let prices = LpPricer::default().price_feasible(&v, &alloc, 10.0).unwrap();
        assert!((prices.resource_price(0) - 5.0).abs() < TOL);
        assert!((prices.resource_price(1) - 5.0).abs() < TOL);
    }

    #[test]
    fn test_nonnegative_infeasible() {
        // Agent 1 must be subsidized by at least 5 at rent 120
        let (v, alloc) = instance(&[vec![150.0, 0.0], vec![140.0, 10.0]]);
        let outcome = LpPricer::default()
            .price_nonnegative(&v, &alloc, 120.0)
            .unwrap();
        assert_eq!(outcome, PricingOutcome::NoNonnegativePricing);
    }

    #[test]
    fn test_nonnegative_feasible() {
        let (v, alloc) = instance(&[vec![150.0, 0.0], vec![140.0, 10.0]]);
        let outcome = LpPricer::default()
            .price_nonnegative(&v, &alloc, 150.0)
            .unwrap();
        let prices = outcome.prices().expect("nonnegative pricing exists at rent 150");
        assert!(prices.as_slice().iter().all(|&p| p >= -TOL));
        assert!(is_budget_balanced(prices, 150.0, TOL));
        assert!(is_envy_free(&v, &alloc, prices, TOL));
    }

    #[test]
    fn test_max_min_without_positive_pricing() {
        let (v, alloc) = instance(&[vec![150.0, 10.0], vec![140.0, 10.0]]);
        let outcome = LpPricer::default().price_max_min(&v, &alloc, 130.0).unwrap();
        match outcome {
            PricingOutcome::NoPositivePricing { best_minimum_price } => {
                assert!(best_minimum_price.abs() < 1e-4);
            }
            other => panic!("expected no positive pricing, got {other:?}"),
        }
    }

    #[test]
    fn test_max_min_positive() {
        let (v, alloc) = instance(&[vec![150.0, 10.0], vec![140.0, 10.0]]);
        let outcome = LpPricer::default().price_max_min(&v, &alloc, 150.0).unwrap();
        let prices = outcome.into_prices().expect("positive pricing exists at rent 150");
        assert!((prices.agent_price(&alloc, 0) - 140.0).abs() < 1e-4);
        assert!((prices.agent_price(&alloc, 1) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_dispatch_matches_variants() {
        let (v, alloc) = instance(&[vec![150.0, 10.0], vec![140.0, 10.0]]);
        let pricer = LpPricer::default();
        let outcome = pricer
            .price(&v, &alloc, 150.0, LpObjective::MaximizeMinimum)
            .unwrap();
        assert!(outcome.is_priced());
        let outcome = pricer
            .price(&v, &alloc, 130.0, LpObjective::Feasibility)
            .unwrap();
        assert!(outcome.is_priced());
    }

    #[test]
    fn test_positive_cycle_reported_before_solving() {
        let v = ValuationMatrix::from_rows(&[vec![150.0, 0.0], vec![140.0, 10.0]]).unwrap();
        let alloc = Allocation::new(vec![1, 0]).unwrap();
        let result = LpPricer::default().price_nonnegative(&v, &alloc, 130.0);
        assert!(matches!(
            result,
            Err(AllocationError::PositiveEnvyCycle { .. })
        ));
    }
}
