use crate::{
    error::{AllocationError, Result},
    fairness::expected_utilities,
    lp_builder::{LpBuilder, LpPrimitives},
    solver::{LpStatus, SolverConfig, solve_lp},
    types::{ProbabilityMatrix, ValuationMatrix},
    validation::{check_baseline, check_square},
};
use faer::Mat;
use log::debug;

/// Fractional allocations found by linear programming over a doubly stochastic matrix.
///
/// Variable `i * n + j` is the probability that agent `i` receives resource `j`.
#[derive(Debug, Clone, Default)]
pub struct RandomAllocationEngine {
    config: SolverConfig,
}

impl RandomAllocationEngine {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Welfare-maximizing lottery that is envy-free in expectation.
    ///
    /// The uniform matrix is always envy-free, so the program is never
    /// infeasible for a well-formed square instance.
    pub fn compute_random_allocation(
        &self,
        valuations: &ValuationMatrix,
    ) -> Result<ProbabilityMatrix> {
        check_square(valuations)?;

        let primitives = build_lottery_program(valuations, LotteryConstraints::EnvyFree)?;
        let solution = solve_lp(&primitives, &self.config)?;
        if solution.status != LpStatus::Optimal {
            return Err(AllocationError::LpSolver(format!(
                "envy-free lottery program ended with status {:?}",
                solution.status
            )));
        }

        let probabilities = to_probability_matrix(&solution.x, valuations.n_agents());
        debug!(
            "Envy-free random allocation with total expected utility {}",
            -solution.objective_value
        );
        Ok(probabilities)
    }

    /// Search for a lottery that gives every agent at least its baseline utility
    /// and strictly more in total. Envy-freeness is not required.
    pub fn find_pareto_improvement(
        &self,
        valuations: &ValuationMatrix,
        baseline_utilities: &[f64],
    ) -> Result<Option<ProbabilityMatrix>> {
        check_square(valuations)?;
        check_baseline(valuations, baseline_utilities)?;

        let primitives = build_lottery_program(
            valuations,
            LotteryConstraints::Dominates(baseline_utilities),
        )?;
        let solution = solve_lp(&primitives, &self.config)?;

        match solution.status {
            LpStatus::Optimal => {}
            LpStatus::Infeasible => {
                debug!("No lottery reaches the baseline utilities");
                return Ok(None);
            }
            LpStatus::Unbounded => {
                return Err(AllocationError::LpSolver(
                    "Pareto search program reported unbounded".to_string(),
                ));
            }
        }

        let probabilities = to_probability_matrix(&solution.x, valuations.n_agents());
        let current: f64 = expected_utilities(valuations, &probabilities).iter().sum();
        let previous: f64 = baseline_utilities.iter().sum();
        let slack = self.config.tolerance * previous.abs().max(1.0);

        debug!("Pareto search: total expected utility {current} against baseline {previous}");
        if current > previous + slack {
            Ok(Some(probabilities))
        } else {
            Ok(None)
        }
    }
}

/// Constraints layered on top of double stochasticity
enum LotteryConstraints<'a> {
    /// Nobody prefers another agent's lottery
    EnvyFree,
    /// Everybody gets at least the given expected utility
    Dominates(&'a [f64]),
}

/// Maximize total expected utility over doubly stochastic matrices
fn build_lottery_program(
    valuations: &ValuationMatrix,
    constraints: LotteryConstraints<'_>,
) -> Result<LpPrimitives> {
    let n = valuations.n_agents();
    let var = |agent: usize, resource: usize| agent * n + resource;
    let mut lp = LpBuilder::new(n * n);

    // Each agent's probabilities sum to one
    for i in 0..n {
        let row: Vec<(usize, f64)> = (0..n).map(|j| (var(i, j), 1.0)).collect();
        lp.add_eq(&row, 1.0)?;
    }
    // Each resource is handed out with total probability one
    for j in 0..n {
        let col: Vec<(usize, f64)> = (0..n).map(|i| (var(i, j), 1.0)).collect();
        lp.add_eq(&col, 1.0)?;
    }
    // 0 <= P[i][j] <= 1
    for i in 0..n {
        for j in 0..n {
            lp.add_ge(&[(var(i, j), 1.0)], 0.0)?;
            lp.add_le(&[(var(i, j), 1.0)], 1.0)?;
        }
    }

    match constraints {
        LotteryConstraints::EnvyFree => {
            // sum_k P[j][k] v[i][k] - sum_k P[i][k] v[i][k] <= 0
            for i in 0..n {
                for j in (0..n).filter(|&j| j != i) {
                    let mut terms = Vec::with_capacity(2 * n);
                    for k in 0..n {
                        terms.push((var(j, k), valuations.value(i, k)));
                        terms.push((var(i, k), -valuations.value(i, k)));
                    }
                    lp.add_le(&terms, 0.0)?;
                }
            }
        }
        LotteryConstraints::Dominates(baseline) => {
            for (i, &floor) in baseline.iter().enumerate() {
                let terms: Vec<(usize, f64)> =
                    (0..n).map(|k| (var(i, k), valuations.value(i, k))).collect();
                lp.add_ge(&terms, floor)?;
            }
        }
    }

    // The solver minimizes, so negate the welfare
    for i in 0..n {
        for j in 0..n {
            lp.set_cost(var(i, j), -valuations.value(i, j))?;
        }
    }

    lp.build()
}

/// Reshape the solver output, clipping interior-point noise into `[0, 1]`
fn to_probability_matrix(x: &[f64], n: usize) -> ProbabilityMatrix {
    ProbabilityMatrix::from_mat(Mat::from_fn(n, n, |i, j| x[i * n + j].clamp(0.0, 1.0)))
}
