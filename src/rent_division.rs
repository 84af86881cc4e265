use crate::{
    envy_graph::EnvyGraphPricer,
    error::Result,
    lp_pricing::{LpObjective, LpPricer},
    matching::compute_allocation,
    solver::SolverConfig,
    types::{Allocation, PricingOutcome, ValuationMatrix},
};
use derive_builder::Builder;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the welfare-maximizing allocation gets priced
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingStrategy {
    #[default]
    EnvyGraph,
    Lp(LpObjective),
}

/// Allocation plus the pricing outcome for it
#[derive(Debug, Clone, PartialEq)]
pub struct RoomAssignment {
    pub allocation: Allocation,
    pub outcome: PricingOutcome,
}

/// Envy-free rent division: assign rooms by maximum welfare, then price them
#[derive(Debug, Clone, Builder)]
pub struct RentDivision {
    valuations: ValuationMatrix,
    rent: f64,
    #[builder(default)]
    strategy: PricingStrategy,
    #[builder(default)]
    solver: SolverConfig,
}

impl RentDivision {
    pub fn compute(&self) -> Result<RoomAssignment> {
        let allocation = compute_allocation(&self.valuations)?;
        debug!("Allocation: {:?}", allocation.as_slice());

        let outcome = match self.strategy {
            PricingStrategy::EnvyGraph => PricingOutcome::Priced(
                EnvyGraphPricer::new(self.solver.clone()).price(
                    &self.valuations,
                    &allocation,
                    self.rent,
                )?,
            ),
            PricingStrategy::Lp(objective) => LpPricer::new(self.solver.clone()).price(
                &self.valuations,
                &allocation,
                self.rent,
                objective,
            )?,
        };

        Ok(RoomAssignment {
            allocation,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AllocationError, fairness::is_envy_free};

    fn example_valuations() -> ValuationMatrix {
        ValuationMatrix::from_rows(&[
            vec![10.0, 20.0, 70.0],
            vec![20.0, 45.0, 35.0],
            vec![10.0, 45.0, 45.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_default_strategy_is_envy_graph() {
        let division = RentDivisionBuilder::default()
            .valuations(example_valuations())
            .rent(100.0)
            .build()
            .unwrap();
        assert_eq!(division.strategy, PricingStrategy::EnvyGraph);

        let result = division.compute().unwrap();
        let prices = result.outcome.prices().unwrap();
        assert!((prices.total() - 100.0).abs() < 1e-9);
        assert!(is_envy_free(
            &example_valuations(),
            &result.allocation,
            prices,
            1e-9
        ));
    }

    #[test]
    fn test_lp_strategy() {
        let result = RentDivisionBuilder::default()
            .valuations(example_valuations())
            .rent(100.0)
            .strategy(PricingStrategy::Lp(LpObjective::MaximizeMinimum))
            .build()
            .unwrap()
            .compute()
            .unwrap();
        let prices = result.outcome.prices().expect("positive pricing exists");
        assert!(prices.min_price() > 0.0);
        assert!(is_envy_free(
            &example_valuations(),
            &result.allocation,
            prices,
            1e-5
        ));
    }

    #[test]
    fn test_missing_rent_is_a_build_error() {
        let result = RentDivisionBuilder::default()
            .valuations(example_valuations())
            .build();
        assert!(result.is_err());

        let err: AllocationError = result.unwrap_err().into();
        assert!(matches!(err, AllocationError::RentDivisionBuild(_)));
    }
}
