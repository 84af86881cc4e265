use fair_division::{
    ProbabilityMatrix, RandomAllocationEngine, ValuationMatrix, error::Result,
    fairness::expected_utilities,
};

fn print_lottery(label: &str, valuations: &ValuationMatrix, lottery: &ProbabilityMatrix) {
    println!("{label}");
    for (agent, row) in lottery.to_rows().iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|p| format!("{p:>6.3}")).collect();
        println!("  agent {agent}: [{}]", cells.join(", "));
    }
    let utilities = expected_utilities(valuations, lottery);
    println!(
        "  expected utilities {:?}, total {:.3}",
        utilities,
        utilities.iter().sum::<f64>()
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let valuations = ValuationMatrix::from_rows(&[
        vec![10.0, 20.0, 70.0],
        vec![20.0, 45.0, 35.0],
        vec![10.0, 45.0, 45.0],
    ])?;
    let engine = RandomAllocationEngine::default();

    let fair = engine.compute_random_allocation(&valuations)?;
    print_lottery("Envy-free lottery", &valuations, &fair);

    let baseline = expected_utilities(&valuations, &fair);
    match engine.find_pareto_improvement(&valuations, &baseline)? {
        Some(improved) => print_lottery("Pareto improvement", &valuations, &improved),
        None => println!("The envy-free lottery is already Pareto optimal"),
    }

    Ok(())
}
