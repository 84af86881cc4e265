//! Envy-free fair division of indivisible resources
//!
//! This library assigns resources to agents by maximum welfare and prices the
//! assignment so that no agent prefers another agent's (resource, price) pair
//! while the prices add up to a fixed rent. Pricing is available through the
//! envy graph or through linear programming. A separate engine computes
//! envy-free lotteries (doubly stochastic matrices) and searches for Pareto
//! improvements over them.

pub mod envy_graph;
pub mod error;
pub mod fairness;
mod lp_builder;
pub mod lp_pricing;
pub mod matching;
pub mod random_allocation;
pub mod rent_division;
pub mod solver;
pub mod types;
mod validation;

// Re-export main types and functions
pub use envy_graph::{EnvyGraph, EnvyGraphPricer};
pub use error::{AllocationError, Result};
pub use lp_pricing::{LpObjective, LpPricer};
pub use matching::compute_allocation;
pub use random_allocation::RandomAllocationEngine;
pub use rent_division::{
    PricingStrategy, RentDivision, RentDivisionBuilder, RoomAssignment,
};
pub use solver::{LpStatus, SolverConfig, SolverConfigBuilder};
pub use types::{Allocation, PriceVector, PricingOutcome, ProbabilityMatrix, ValuationMatrix};
