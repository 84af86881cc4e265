use fair_division::{
    LpObjective, PricingOutcome, PricingStrategy, RentDivisionBuilder, ValuationMatrix,
    error::Result,
};

fn build_sample_inputs() -> Result<Vec<(&'static str, ValuationMatrix, f64)>> {
    Ok(vec![
        (
            "Subsidized roommate",
            ValuationMatrix::from_rows(&[vec![150.0, 0.0], vec![140.0, 10.0]])?,
            130.0,
        ),
        (
            "Identical roommates",
            ValuationMatrix::from_rows(&[vec![10.0, 10.0], vec![10.0, 10.0]])?,
            10.0,
        ),
        (
            "Three rooms",
            ValuationMatrix::from_rows(&[
                vec![10.0, 20.0, 70.0],
                vec![20.0, 45.0, 35.0],
                vec![10.0, 45.0, 45.0],
            ])?,
            100.0,
        ),
    ])
}

fn main() -> Result<()> {
    env_logger::init();

    let strategies = [
        ("envy graph", PricingStrategy::EnvyGraph),
        ("LP any", PricingStrategy::Lp(LpObjective::Feasibility)),
        ("LP >= 0", PricingStrategy::Lp(LpObjective::Nonnegative)),
        ("LP max-min", PricingStrategy::Lp(LpObjective::MaximizeMinimum)),
    ];

    for (name, valuations, rent) in build_sample_inputs()? {
        println!("{name} (rent {rent})");
        println!("{:>12}  {:>6}  {:>6}  {:>10}", "Strategy", "Agent", "Room", "Price");

        for (label, strategy) in strategies {
            let result = RentDivisionBuilder::default()
                .valuations(valuations.clone())
                .rent(rent)
                .strategy(strategy)
                .build()?
                .compute()?;

            match &result.outcome {
                PricingOutcome::Priced(prices) => {
                    for (agent, room) in result.allocation.iter() {
                        println!(
                            "{:>12}  {:>6}  {:>6}  {:>10.2}",
                            label,
                            agent,
                            room,
                            prices.resource_price(room)
                        );
                    }
                }
                PricingOutcome::NoNonnegativePricing => {
                    println!("{label:>12}  no pricing with all prices >= 0");
                }
                PricingOutcome::NoPositivePricing { best_minimum_price } => {
                    println!(
                        "{label:>12}  no pricing with all prices > 0 (best minimum {best_minimum_price:.4})"
                    );
                }
            }
        }
        println!();
    }

    Ok(())
}
