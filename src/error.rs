use crate::{rent_division::RentDivisionBuilderError, solver::SolverConfigBuilderError};
use thiserror::Error;

/// Error types for allocation and pricing
#[derive(Debug, Error)]
pub enum AllocationError {
    /// No agents or no resources
    #[error("The valuation matrix must contain at least one agent and one resource.")]
    EmptyValuations,

    /// Rows of different lengths
    #[error("Valuation row {row} has {found} entries; expected {expected}.")]
    RaggedValuations {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// NaN or infinite valuation
    #[error("Agent {agent} has a non-finite value {value} for resource {resource}.")]
    NonFiniteValuation {
        agent: usize,
        resource: usize,
        value: f64,
    },

    /// Matching and pricing need one resource per agent
    #[error("Expected a square instance, got {agents} agents and {resources} resources.")]
    NonSquare { agents: usize, resources: usize },

    /// Allocation is not a bijection onto the resources
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Rent must be finite, got {0}.")]
    NonFiniteRent(f64),

    /// Baseline utilities do not line up with the agents
    #[error("Expected {expected} baseline utilities, got {found}.")]
    BaselineLength { expected: usize, found: usize },

    #[error("Baseline utility of agent {agent} is not finite: {value}.")]
    NonFiniteBaseline { agent: usize, value: f64 },

    /// The envy graph has a cycle of positive total envy, so heaviest paths are unbounded
    #[error(
        "The envy graph has a positive-weight cycle reachable from agent {agent}; the allocation does not maximize welfare."
    )]
    PositiveEnvyCycle { agent: usize },

    /// Linear programming solver failure
    #[error("Linear programming failed: {0}")]
    LpSolver(String),

    #[error("Matrix construction failed: {0}")]
    MatrixConstruction(String),

    #[error("Solver configuration build error: {0}")]
    ConfigBuild(#[from] SolverConfigBuilderError),

    #[error("Rent division configuration build error: {0}")]
    RentDivisionBuild(#[from] RentDivisionBuilderError),
}

/// Result type alias for allocation operations
pub type Result<T> = std::result::Result<T, AllocationError>;
