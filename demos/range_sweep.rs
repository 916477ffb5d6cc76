//! Range of both wing configurations against runway length.
//!
//! Run with `cargo run --example range_sweep`.

use gpsize::aircraft::{Mission, Objective, WingMode};
use gpsize::logging::init_tracing;
use gpsize::model::Substitutions;
use gpsize::sensitivity::rank;
use gpsize::sweep::{sweep, SweepSpec};

fn main() -> anyhow::Result<()> {
    init_tracing("warn");

    for mode in [WingMode::Conventional, WingMode::Blown] {
        let mission = Mission::build(mode, Objective::Range)?;
        let spec = SweepSpec::new().axis(
            &mission.takeoff.s_runway,
            vec![100.0, 200.0, 300.0, 400.0],
        )?;

        println!("{mode} wing");
        for point in sweep(&mission.root, &Substitutions::new(), spec, true)? {
            let point = point?;
            let runway = point.point.value(&mission.takeoff.s_runway).unwrap_or_default();
            match &point.outcome {
                Ok(solution) => {
                    let range = mission.range_km(solution).unwrap_or_default();
                    let top = rank(solution, 1)
                        .first()
                        .map(|s| s.to_string())
                        .unwrap_or_default();
                    println!("  runway {runway:>5.0} m: range {range:>6.1} km  ({top})");
                }
                Err(err) => println!("  runway {runway:>5.0} m: {}", err.status()),
            }
        }
    }
    Ok(())
}
