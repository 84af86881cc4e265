use crate::error::{AllocationError, Result};
use clarabel::algebra::CscMatrix;

/// Sparse coefficient entry `(row, column, value)`
type Triplet = (usize, usize, f64);

/// Linear program over free real variables:
///
/// ```text
/// minimize    cost' x
/// subject to  a_eq x == b_eq
///             a_ub x <= b_ub
/// ```
#[derive(Debug)]
pub(crate) struct LpPrimitives {
    pub a_eq: CscMatrix<f64>,
    pub b_eq: Vec<f64>,
    pub a_ub: CscMatrix<f64>,
    pub b_ub: Vec<f64>,
    pub cost: Vec<f64>,
}

impl LpPrimitives {
    pub(crate) fn n_vars(&self) -> usize {
        self.cost.len()
    }
}

/// Row-by-row accumulator for [`LpPrimitives`]
#[derive(Debug)]
pub(crate) struct LpBuilder {
    n_vars: usize,
    eq: Vec<Triplet>,
    b_eq: Vec<f64>,
    ub: Vec<Triplet>,
    b_ub: Vec<f64>,
    cost: Vec<f64>,
}

impl LpBuilder {
    pub(crate) fn new(n_vars: usize) -> Self {
        Self {
            n_vars,
            eq: Vec::new(),
            b_eq: Vec::new(),
            ub: Vec::new(),
            b_ub: Vec::new(),
            cost: vec![0.0; n_vars],
        }
    }

    /// Add `sum(coef * x[col]) == rhs`
    pub(crate) fn add_eq(&mut self, terms: &[(usize, f64)], rhs: f64) -> Result<()> {
        let row = self.b_eq.len();
        push_row(&mut self.eq, row, terms, self.n_vars)?;
        self.b_eq.push(rhs);
        Ok(())
    }

    /// Add `sum(coef * x[col]) <= rhs`
    pub(crate) fn add_le(&mut self, terms: &[(usize, f64)], rhs: f64) -> Result<()> {
        let row = self.b_ub.len();
        push_row(&mut self.ub, row, terms, self.n_vars)?;
        self.b_ub.push(rhs);
        Ok(())
    }

    /// Add `sum(coef * x[col]) >= rhs`
    pub(crate) fn add_ge(&mut self, terms: &[(usize, f64)], rhs: f64) -> Result<()> {
        let negated: Vec<(usize, f64)> = terms.iter().map(|&(col, coef)| (col, -coef)).collect();
        self.add_le(&negated, -rhs)
    }

    /// Objective coefficient of one variable (the program minimizes)
    pub(crate) fn set_cost(&mut self, col: usize, coef: f64) -> Result<()> {
        let slot = self.cost.get_mut(col).ok_or_else(|| {
            AllocationError::MatrixConstruction(format!("Objective column {col} out of bounds"))
        })?;
        *slot = coef;
        Ok(())
    }

    pub(crate) fn build(self) -> Result<LpPrimitives> {
        let a_eq = build_csc_from_triplets(&self.eq, self.b_eq.len(), self.n_vars)?;
        let a_ub = build_csc_from_triplets(&self.ub, self.b_ub.len(), self.n_vars)?;

        Ok(LpPrimitives {
            a_eq,
            b_eq: self.b_eq,
            a_ub,
            b_ub: self.b_ub,
            cost: self.cost,
        })
    }
}

fn push_row(
    triplets: &mut Vec<Triplet>,
    row: usize,
    terms: &[(usize, f64)],
    n_vars: usize,
) -> Result<()> {
    for &(col, coef) in terms {
        if col >= n_vars {
            return Err(AllocationError::MatrixConstruction(format!(
                "Column index {col} out of bounds for {n_vars} variables"
            )));
        }
        if !coef.is_finite() {
            return Err(AllocationError::MatrixConstruction(format!(
                "Non-finite coefficient {coef} in row {row}, column {col}"
            )));
        }
        if coef != 0.0 {
            triplets.push((row, col, coef));
        }
    }
    Ok(())
}

/// Build CSC matrix from triplets, summing duplicate entries
pub(crate) fn build_csc_from_triplets(
    triplets: &[Triplet],
    n_rows: usize,
    n_cols: usize,
) -> Result<CscMatrix<f64>> {
    if triplets.is_empty() {
        return Ok(CscMatrix::new(
            n_rows,
            n_cols,
            vec![0; n_cols + 1],
            vec![],
            vec![],
        ));
    }

    if let Some(&(row, col, _)) = triplets.iter().find(|&&(r, c, _)| r >= n_rows || c >= n_cols) {
        return Err(AllocationError::MatrixConstruction(format!(
            "Entry ({row}, {col}) outside a {n_rows}x{n_cols} matrix"
        )));
    }

    // Sort triplets by column, then row
    let mut sorted_triplets = triplets.to_vec();
    sorted_triplets.sort_by_key(|&(r, c, _)| (c, r));

    let mut col_ptr = vec![0];
    let mut row_ind: Vec<usize> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    let mut current_col = 0;
    let mut last: Option<(usize, usize)> = None;

    for &(row, col, val) in &sorted_triplets {
        // Fill in empty columns
        while current_col < col {
            col_ptr.push(row_ind.len());
            current_col += 1;
        }

        if last == Some((row, col)) {
            if let Some(slot) = values.last_mut() {
                *slot += val;
            }
            continue;
        }

        row_ind.push(row);
        values.push(val);
        last = Some((row, col));
    }

    // Fill remaining columns
    while current_col < n_cols {
        col_ptr.push(row_ind.len());
        current_col += 1;
    }

    Ok(CscMatrix::new(n_rows, n_cols, col_ptr, row_ind, values))
}
