use crate::{
    error::{AllocationError, Result},
    lp_builder::{LpPrimitives, build_csc_from_triplets},
};
use clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT},
};
use derive_builder::Builder;
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type alias for stacked constraints
type StackedConstraints = (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>);

/// Numeric settings shared by every LP-backed component
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct SolverConfig {
    #[builder(default = "10000")]
    pub max_iter: u32,
    /// Wall-clock limit in seconds; expiry is reported as a solver failure
    #[builder(default = "f64::INFINITY")]
    pub time_limit: f64,
    #[builder(default = "1e-8")]
    pub tol_gap_abs: f64,
    #[builder(default = "1e-8")]
    pub tol_gap_rel: f64,
    #[builder(default = "1e-8")]
    pub tol_feas: f64,
    /// Slack for "strictly positive", "strict improvement" and envy-cycle decisions
    #[builder(default = "1e-6")]
    pub tolerance: f64,
    #[builder(default = "false")]
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 10000,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            tolerance: 1e-6,
            verbose: false,
        }
    }
}

/// Terminal state of a solve that produced a usable answer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

/// Result of solving an LP
#[derive(Debug)]
pub(crate) struct LpSolution {
    pub status: LpStatus,
    pub x: Vec<f64>,
    pub objective_value: f64,
}

/// LP solver wrapper for Clarabel
pub(crate) struct LpSolver {
    solver: DefaultSolver<f64>,
}

impl LpSolver {
    /// Create a new LP solver from primitives
    pub(crate) fn new(primitives: &LpPrimitives, config: &SolverConfig) -> Result<Self> {
        // Clarabel's standard form:
        // minimize    (1/2) x'Px + q'x
        // subject to  Ax + s = b
        //             s in K
        //
        // P = 0, equalities go to the zero cone and A_ub x <= b_ub to the
        // nonnegative cone. Variables are free.
        let n_vars = primitives.n_vars();

        let p = CscMatrix::new(n_vars, n_vars, vec![0; n_vars + 1], vec![], vec![]);
        let q = primitives.cost.clone();
        let (a, b, cones) = stack_constraints(primitives)?;

        let settings = DefaultSettings::<f64> {
            verbose: config.verbose,
            max_iter: config.max_iter,
            time_limit: config.time_limit,
            tol_gap_abs: config.tol_gap_abs,
            tol_gap_rel: config.tol_gap_rel,
            tol_feas: config.tol_feas,
            ..Default::default()
        };

        debug!(
            "LP with {n_vars} variables, {} equalities, {} inequalities",
            primitives.b_eq.len(),
            primitives.b_ub.len()
        );

        let solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings).map_err(|e| {
            AllocationError::LpSolver(format!("Failed to create Clarabel solver: {e}"))
        })?;

        Ok(Self { solver })
    }

    /// Solve the LP. Infeasible and unbounded programs are statuses, not errors.
    pub(crate) fn solve(mut self) -> Result<LpSolution> {
        self.solver.solve();

        let status = self.solver.info.status;
        debug!("Clarabel finished with status {status:?}");

        let lp_status = match status {
            SolverStatus::Solved => LpStatus::Optimal,
            SolverStatus::PrimalInfeasible => LpStatus::Infeasible,
            SolverStatus::DualInfeasible => LpStatus::Unbounded,
            SolverStatus::AlmostSolved => {
                warn!("Clarabel reached reduced accuracy only; accepting the solution");
                LpStatus::Optimal
            }
            SolverStatus::AlmostPrimalInfeasible => {
                warn!("Clarabel reports the program is almost primal infeasible");
                LpStatus::Infeasible
            }
            SolverStatus::AlmostDualInfeasible => {
                warn!("Clarabel reports the program is almost dual infeasible");
                LpStatus::Unbounded
            }
            SolverStatus::MaxIterations => {
                return Err(AllocationError::LpSolver(
                    "Maximum iterations reached".to_string(),
                ));
            }
            SolverStatus::MaxTime => {
                return Err(AllocationError::LpSolver("Time limit reached".to_string()));
            }
            SolverStatus::NumericalError => {
                return Err(AllocationError::LpSolver(
                    "Numerical error in solver".to_string(),
                ));
            }
            SolverStatus::InsufficientProgress => {
                return Err(AllocationError::LpSolver(
                    "Solver made insufficient progress".to_string(),
                ));
            }
            _ => {
                return Err(AllocationError::LpSolver(format!(
                    "Unexpected solver status: {status:?}"
                )));
            }
        };

        Ok(LpSolution {
            status: lp_status,
            x: self.solver.solution.x.clone(),
            objective_value: self.solver.info.cost_primal,
        })
    }
}

/// Build and solve in one step
pub(crate) fn solve_lp(primitives: &LpPrimitives, config: &SolverConfig) -> Result<LpSolution> {
    LpSolver::new(primitives, config)?.solve()
}

/// Stack equality and inequality constraints for Clarabel format
fn stack_constraints(primitives: &LpPrimitives) -> Result<StackedConstraints> {
    let n_vars = primitives.n_vars();
    let n_eq = primitives.a_eq.m;
    let n_ineq = primitives.a_ub.m;

    if primitives.b_eq.len() != n_eq || primitives.b_ub.len() != n_ineq {
        return Err(AllocationError::MatrixConstruction(format!(
            "Right-hand sides ({}, {}) do not match constraint rows ({n_eq}, {n_ineq})",
            primitives.b_eq.len(),
            primitives.b_ub.len()
        )));
    }

    // A_eq on top, A_ub below it
    let mut triplets =
        Vec::with_capacity(primitives.a_eq.nzval.len() + primitives.a_ub.nzval.len());
    append_entries(&mut triplets, &primitives.a_eq, 0);
    append_entries(&mut triplets, &primitives.a_ub, n_eq);

    let a = build_csc_from_triplets(&triplets, n_eq + n_ineq, n_vars)?;

    let mut b = Vec::with_capacity(n_eq + n_ineq);
    b.extend_from_slice(&primitives.b_eq);
    b.extend_from_slice(&primitives.b_ub);

    let mut cones = Vec::new();
    if n_eq > 0 {
        cones.push(SupportedConeT::ZeroConeT(n_eq));
    }
    if n_ineq > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(n_ineq));
    }

    Ok((a, b, cones))
}

fn append_entries(triplets: &mut Vec<(usize, usize, f64)>, matrix: &CscMatrix<f64>, offset: usize) {
    for col in 0..matrix.n {
        let start = matrix.colptr[col];
        let end = matrix.colptr[col + 1];

        for idx in start..end {
            triplets.push((matrix.rowval[idx] + offset, col, matrix.nzval[idx]));
        }
    }
}
