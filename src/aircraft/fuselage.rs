//! Fuselage, landing gear and fixed equipment.

use crate::atoms::pow;
use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;

use super::state::FlightState;

/// Fixed-shape fuselage with a wetted-area estimate.
#[derive(Debug, Clone)]
pub struct Fuselage {
    pub m: VarKey,
    pub l: VarKey,
    pub w: VarKey,
    pub h: VarKey,
    pub s_wet: VarKey,
    /// Fineness ratio.
    pub f: VarKey,
}

impl Fuselage {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Fuselage", parent.table());
        let m = b.var(var("m", "kg").nominal(300.0).describe("fuselage mass"))?;
        let l = b.var(var("l", "m").value(7.39).describe("length"))?;
        let w = b.var(var("w", "m").value(1.73).describe("width"))?;
        let h = b.var(var("h", "m").value(2.61).describe("height"))?;
        let s_wet = b.var(var("Swet", "m^2").nominal(65.0).describe("wetted area"))?;
        let f = b.var(var("f", "-").nominal(2.8).describe("fineness ratio"))?;

        b.geq(&s_wet, 2.1 * (&l * &w + &l * &h))?;
        b.equals(&f, &l / &h)?;
        parent.child(b.build()?);

        Ok(Fuselage {
            m,
            l,
            w,
            h,
            s_wet,
            f,
        })
    }
}

/// Fuselage skin-friction drag in one flight state.
#[derive(Debug, Clone)]
pub struct FuselagePerf {
    pub cd: VarKey,
    pub c_f: VarKey,
    pub re: VarKey,
}

impl FuselagePerf {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        fuselage: &Fuselage,
        state: &FlightState,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Fuselage", parent.table());
        let re = b.var(var("Re", "-").nominal(3e7).describe("length Reynolds number"))?;
        let c_f = b.var(var("C_f", "-").nominal(0.003).describe("skin friction coefficient"))?;
        let ff = b.var(var("FF", "-").nominal(2.8).describe("form factor"))?;
        let cd = b.var(var("Cd", "-").nominal(0.01).describe("drag coefficient on wetted area"))?;
        let mfac = b.var(var("mfac", "-").value(1.2).describe("drag margin"))?;

        b.equals(&ff, &fuselage.l / &fuselage.h)?;
        b.geq(&c_f, 0.455 * pow(&re, -0.3))?;
        b.equals(&cd, &mfac * &c_f * &ff)?;
        b.equals(&re, &state.v * &state.rho * &fuselage.l / &state.mu)?;
        parent.child(b.build()?);

        Ok(FuselagePerf { cd, c_f, re })
    }
}

/// Landing gear, sized as a fraction of the gross mass.
#[derive(Debug, Clone)]
pub struct Gear {
    pub m: VarKey,
    pub l: VarKey,
}

impl Gear {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Gear", parent.table());
        let m = b.var(var("m", "kg").nominal(60.0).describe("gear mass"))?;
        let l = b.var(var("l", "m").nominal(1.2).describe("strut length"))?;
        parent.child(b.build()?);
        Ok(Gear { m, l })
    }
}

/// Avionics, seats and systems.
#[derive(Debug, Clone)]
pub struct Equipment {
    pub m: VarKey,
}

impl Equipment {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Equipment", parent.table());
        let m = b.var(var("m", "kg").nominal(220.0).describe("equipment mass"))?;
        parent.child(b.build()?);
        Ok(Equipment { m })
    }
}
