use crate::{
    error::{AllocationError, Result},
    types::{Allocation, ValuationMatrix},
};

/// Matching and pricing need exactly one resource per agent
pub(crate) fn check_square(valuations: &ValuationMatrix) -> Result<()> {
    if !valuations.is_square() {
        return Err(AllocationError::NonSquare {
            agents: valuations.n_agents(),
            resources: valuations.n_resources(),
        });
    }
    Ok(())
}

pub(crate) fn check_rent(rent: f64) -> Result<()> {
    if !rent.is_finite() {
        return Err(AllocationError::NonFiniteRent(rent));
    }
    Ok(())
}

/// Validate all inputs for pricing a fixed allocation
pub(crate) fn check_pricing_inputs(
    valuations: &ValuationMatrix,
    allocation: &Allocation,
    rent: f64,
) -> Result<()> {
    check_square(valuations)?;
    check_rent(rent)?;
    check_allocation(valuations, allocation)
}

/// The allocation must cover exactly the agents of the valuation matrix
pub(crate) fn check_allocation(
    valuations: &ValuationMatrix,
    allocation: &Allocation,
) -> Result<()> {
    if allocation.len() != valuations.n_agents() {
        return Err(AllocationError::InvalidAllocation(format!(
            "allocation covers {} agents, valuations have {}",
            allocation.len(),
            valuations.n_agents()
        )));
    }
    Ok(())
}

/// Baseline utilities must give one finite number per agent
pub(crate) fn check_baseline(valuations: &ValuationMatrix, baseline: &[f64]) -> Result<()> {
    if baseline.len() != valuations.n_agents() {
        return Err(AllocationError::BaselineLength {
            expected: valuations.n_agents(),
            found: baseline.len(),
        });
    }

    if let Some((agent, &value)) = baseline.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AllocationError::NonFiniteBaseline { agent, value });
    }

    Ok(())
}
