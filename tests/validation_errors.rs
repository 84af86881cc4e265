use fair_division::{
    Allocation, EnvyGraphPricer, LpPricer, RandomAllocationEngine, RentDivisionBuilder,
    SolverConfigBuilder, ValuationMatrix, compute_allocation, error::AllocationError,
};

fn create_basic_valuations() -> ValuationMatrix {
    ValuationMatrix::from_rows(&[vec![150.0, 0.0], vec![140.0, 10.0]]).unwrap()
}

fn create_wide_valuations() -> ValuationMatrix {
    ValuationMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]]).unwrap()
}

#[test]
fn test_empty_valuations_rejected() {
    let result = ValuationMatrix::from_rows(&[]);
    assert!(matches!(result, Err(AllocationError::EmptyValuations)));

    let result = ValuationMatrix::from_rows(&[vec![], vec![]]);
    assert!(matches!(result, Err(AllocationError::EmptyValuations)));
}

#[test]
fn test_ragged_valuations_rejected() {
    let result = ValuationMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
    match result.unwrap_err() {
        AllocationError::RaggedValuations {
            row,
            expected,
            found,
        } => {
            assert_eq!(row, 1);
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("Expected RaggedValuations error, got {other:?}"),
    }
}

#[test]
fn test_non_finite_valuation_rejected() {
    let result = ValuationMatrix::from_rows(&[vec![1.0, f64::NAN], vec![3.0, 4.0]]);
    match result.unwrap_err() {
        AllocationError::NonFiniteValuation {
            agent, resource, ..
        } => {
            assert_eq!(agent, 0);
            assert_eq!(resource, 1);
        }
        other => panic!("Expected NonFiniteValuation error, got {other:?}"),
    }
}

#[test]
fn test_non_square_instance_rejected_everywhere() {
    let v = create_wide_valuations();

    let err = compute_allocation(&v).unwrap_err();
    match err {
        AllocationError::NonSquare { agents, resources } => {
            assert_eq!(agents, 2);
            assert_eq!(resources, 3);
        }
        other => panic!("Expected NonSquare error, got {other:?}"),
    }

    let alloc = Allocation::new(vec![0, 1]).unwrap();
    assert!(matches!(
        EnvyGraphPricer::default().price(&v, &alloc, 10.0),
        Err(AllocationError::NonSquare { .. })
    ));
    assert!(matches!(
        LpPricer::default().price_feasible(&v, &alloc, 10.0),
        Err(AllocationError::NonSquare { .. })
    ));
    assert!(matches!(
        RandomAllocationEngine::default().compute_random_allocation(&v),
        Err(AllocationError::NonSquare { .. })
    ));
}

#[test]
fn test_invalid_allocation_rejected() {
    assert!(matches!(
        Allocation::new(vec![]),
        Err(AllocationError::InvalidAllocation(_))
    ));

    match Allocation::new(vec![0, 0]).unwrap_err() {
        AllocationError::InvalidAllocation(msg) => {
            assert!(msg.contains("resource 0 is assigned to both"));
        }
        other => panic!("Expected InvalidAllocation error, got {other:?}"),
    }

    match Allocation::new(vec![0, 2]).unwrap_err() {
        AllocationError::InvalidAllocation(msg) => {
            assert!(msg.contains("only 2 resources"));
        }
        other => panic!("Expected InvalidAllocation error, got {other:?}"),
    }
}

#[test]
fn test_allocation_size_mismatch_rejected() {
    let v = create_basic_valuations();
    let alloc = Allocation::new(vec![0, 1, 2]).unwrap();

    assert!(matches!(
        EnvyGraphPricer::default().price(&v, &alloc, 130.0),
        Err(AllocationError::InvalidAllocation(_))
    ));
    assert!(matches!(
        LpPricer::default().price_nonnegative(&v, &alloc, 130.0),
        Err(AllocationError::InvalidAllocation(_))
    ));
}

#[test]
fn test_non_finite_rent_rejected() {
    let v = create_basic_valuations();
    let alloc = compute_allocation(&v).unwrap();

    assert!(matches!(
        EnvyGraphPricer::default().price(&v, &alloc, f64::INFINITY),
        Err(AllocationError::NonFiniteRent(_))
    ));
    assert!(matches!(
        LpPricer::default().price_max_min(&v, &alloc, f64::NAN),
        Err(AllocationError::NonFiniteRent(_))
    ));
}

#[test]
fn test_non_welfare_maximizing_allocation_rejected() {
    // Swapping the welfare-maximizing allocation leaves a positive envy cycle
    let v = create_basic_valuations();
    let swapped = Allocation::new(vec![1, 0]).unwrap();

    assert!(matches!(
        EnvyGraphPricer::default().price(&v, &swapped, 130.0),
        Err(AllocationError::PositiveEnvyCycle { .. })
    ));
    assert!(matches!(
        LpPricer::default().price_feasible(&v, &swapped, 130.0),
        Err(AllocationError::PositiveEnvyCycle { .. })
    ));
}

#[test]
fn test_bad_baseline_rejected() {
    let v = create_basic_valuations();
    let engine = RandomAllocationEngine::default();

    match engine.find_pareto_improvement(&v, &[1.0, 2.0, 3.0]).unwrap_err() {
        AllocationError::BaselineLength { expected, found } => {
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
        }
        other => panic!("Expected BaselineLength error, got {other:?}"),
    }

    assert!(matches!(
        engine.find_pareto_improvement(&v, &[1.0, f64::NEG_INFINITY]),
        Err(AllocationError::NonFiniteBaseline { agent: 1, .. })
    ));
}

#[test]
fn test_builder_errors_convert() {
    let result = RentDivisionBuilder::default().rent(100.0).build();
    let err: AllocationError = result.unwrap_err().into();
    assert!(matches!(err, AllocationError::RentDivisionBuild(_)));
    assert!(err.to_string().contains("valuations"));

    let config = SolverConfigBuilder::default().max_iter(50).build().unwrap();
    assert_eq!(config.max_iter, 50);
}
