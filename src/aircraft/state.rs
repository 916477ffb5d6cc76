//! Atmospheric state and airspeed of one flight segment.

use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;

#[derive(Debug, Clone)]
pub struct FlightState {
    pub v: VarKey,
    pub rho: VarKey,
    pub mu: VarKey,
}

impl FlightState {
    /// Sea-level standard air; `v_guess` seeds the first linearization.
    pub fn add_to(parent: &mut ModelBuilder<'_>, v_guess: f64) -> Result<Self> {
        let mut b = ModelBuilder::with_table("State", parent.table());
        let v = b.var(var("V", "m/s").nominal(v_guess).describe("true airspeed"))?;
        let (rho, mu) = sea_level(&mut b)?;
        parent.child(b.build()?);
        Ok(FlightState { v, rho, mu })
    }

    /// Sea-level standard air at an airspeed owned by another node, such as
    /// one station of the ground roll.
    pub fn at_speed(parent: &mut ModelBuilder<'_>, v: &VarKey) -> Result<Self> {
        let mut b = ModelBuilder::with_table("State", parent.table());
        let (rho, mu) = sea_level(&mut b)?;
        parent.child(b.build()?);
        Ok(FlightState {
            v: v.clone(),
            rho,
            mu,
        })
    }
}

fn sea_level(b: &mut ModelBuilder<'_>) -> Result<(VarKey, VarKey)> {
    let rho = b.var(var("rho", "kg/m^3").value(1.225).describe("air density"))?;
    let mu = b.var(
        var("mu", "kg/m/s")
            .value(1.789e-5)
            .describe("dynamic viscosity"),
    )?;
    Ok((rho, mu))
}
