use crate::{
    error::Result,
    types::{Allocation, ValuationMatrix},
    validation::check_square,
};
use log::debug;

/// Maximum-welfare one-to-one assignment of agents to resources.
///
/// Solves the assignment problem on the complete bipartite graph whose edge
/// weights are the valuations. Fairness plays no part here; the pricers take
/// care of that. Among several optimal matchings the one returned is fixed by
/// the iteration order, so callers should compare welfare rather than
/// particular assignments.
pub fn compute_allocation(valuations: &ValuationMatrix) -> Result<Allocation> {
    check_square(valuations)?;

    let assignment = hungarian_max_weight(valuations);
    let allocation = Allocation::new(assignment)?;

    debug!(
        "Max weighted matching: {:?} (welfare {})",
        allocation.as_slice(),
        allocation.welfare(valuations)
    );

    Ok(allocation)
}

/// Hungarian method with row/column potentials on the cost matrix `-v`.
///
/// Arrays are 1-indexed; slot 0 is the virtual column used to grow the
/// alternating tree for each new row. Runs in O(n^3).
fn hungarian_max_weight(valuations: &ValuationMatrix) -> Vec<usize> {
    let n = valuations.n_agents();
    let cost = |row: usize, col: usize| -valuations.value(row - 1, col - 1);

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    // p[j]: row matched to column j (0 = free)
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        p[0] = row;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let slack = cost(i0, j) - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the root
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for col in 1..=n {
        if p[col] != 0 {
            assignment[p[col] - 1] = col - 1;
        }
    }
    assignment
}

/// Welfare of the best assignment found by exhaustive search; only sensible for tiny n
#[cfg(test)]
pub(crate) fn brute_force_welfare(valuations: &ValuationMatrix) -> f64 {
    fn permute(arr: &mut [usize], start: usize, visit: &mut dyn FnMut(&[usize])) {
        if start == arr.len() {
            visit(arr);
            return;
        }
        for i in start..arr.len() {
            arr.swap(start, i);
            permute(arr, start + 1, visit);
            arr.swap(start, i);
        }
    }

    let n = valuations.n_agents();
    let mut resources: Vec<usize> = (0..n).collect();
    let mut best = f64::NEG_INFINITY;
    permute(&mut resources, 0, &mut |perm| {
        let total: f64 = perm
            .iter()
            .enumerate()
            .map(|(agent, &resource)| valuations.value(agent, resource))
            .sum();
        best = best.max(total);
    });
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AllocationError;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_two_agents_unique_optimum() {
        let v = ValuationMatrix::from_rows(&[vec![150.0, 0.0], vec![140.0, 10.0]]).unwrap();
        let alloc = compute_allocation(&v).unwrap();
        assert_eq!(alloc.as_slice(), &[0, 1]);
        assert_eq!(alloc.welfare(&v), 160.0);
    }

    #[test]
    fn test_three_agents() {
        let v = ValuationMatrix::from_rows(&[
            vec![10.0, 20.0, 70.0],
            vec![20.0, 45.0, 35.0],
            vec![10.0, 45.0, 45.0],
        ])
        .unwrap();
        let alloc = compute_allocation(&v).unwrap();
        assert_eq!(alloc.welfare(&v), brute_force_welfare(&v));
    }

    #[test]
    fn test_single_agent() {
        let v = ValuationMatrix::from_rows(&[vec![-3.0]]).unwrap();
        let alloc = compute_allocation(&v).unwrap();
        assert_eq!(alloc.as_slice(), &[0]);
    }

    #[test]
    fn test_negative_and_zero_values() {
        let v = ValuationMatrix::from_rows(&[
            vec![-5.0, 0.0, -1.0],
            vec![0.0, -2.0, -7.0],
            vec![-4.0, -3.0, 0.0],
        ])
        .unwrap();
        let alloc = compute_allocation(&v).unwrap();
        assert_eq!(alloc.welfare(&v), 0.0);
    }

    #[test]
    fn test_non_square_rejected() {
        let v = ValuationMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            compute_allocation(&v),
            Err(AllocationError::NonSquare { .. })
        ));
    }

    #[test]
    fn test_matches_brute_force_on_random_instances() {
        let mut rng = StdRng::seed_from_u64(2102834986);
        for _ in 0..200 {
            let n = rng.gen_range(1..=4);
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|_| (0..n).map(|_| rng.gen_range(0..=20) as f64).collect())
                .collect();
            let v = ValuationMatrix::from_rows(&rows).unwrap();
            let alloc = compute_allocation(&v).unwrap();
            assert!(
                (alloc.welfare(&v) - brute_force_welfare(&v)).abs() < 1e-9,
                "Suboptimal matching for {rows:?}: {:?}",
                alloc.as_slice()
            );
        }
    }
}
