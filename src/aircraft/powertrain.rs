//! Electric motor and propeller sizing.
//!
//! The motor relations are curve fits over production motors: peak
//! specific power and efficiency grow with mass while the peak shaft speed
//! falls. The specific-power fit has a constant offset, so it is a
//! signomial relation.

use std::f64::consts::PI;

use crate::atoms::pow;
use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;

/// One motor and its propeller.
#[derive(Debug, Clone)]
pub struct Powertrain {
    pub m: VarKey,
    pub p_max: VarKey,
    pub p_sp_max: VarKey,
    pub rpm_max: VarKey,
    pub eta: VarKey,
    /// Propeller radius.
    pub r: VarKey,
}

impl Powertrain {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Powertrain", parent.table());
        let m = b.var(var("m", "kg").nominal(25.0).describe("motor mass"))?;
        let p_max = b.var(var("Pmax", "W").nominal(100_000.0).describe("peak shaft power"))?;
        let p_sp_max = b.var(
            var("P_sp_max", "W/kg")
                .nominal(4000.0)
                .describe("peak specific power"),
        )?;
        let rpm_max = b.var(var("RPMmax", "rpm").nominal(3700.0))?;
        let eta = b.var(var("eta", "-").nominal(0.9).describe("motor efficiency"))?;
        let r = b.var(var("r", "m").nominal(0.4).describe("propeller radius"))?;

        let rpm_margin = b.var(var("RPM_margin", "-").value(0.9))?;
        let p_margin = b.var(var("P_margin", "-").value(0.5))?;
        let k_rpm = b.var(
            var("k_rpm", "rpm*kg**0.201")
                .value(7939.0)
                .describe("shaft speed fit constant"),
        )?;
        let a = b.var(var("a", "m/s").value(343.0).describe("speed of sound"))?;
        let m_tip = b.var(var("Mlim", "-").value(0.5).describe("tip Mach limit"))?;
        let r_min = b.var(var("r_min", "m").value(0.1))?;

        b.signomial_leq(&p_sp_max, &p_margin * (86.2 * &m + 7860.0))?;
        b.leq(&eta, 0.906 * pow(&m, 0.0134))?;
        b.equals(&rpm_max / &rpm_margin * pow(&m, 0.201), &k_rpm)?;
        b.leq(&p_max, &m * &p_sp_max)?;
        b.leq(&rpm_max * &r * (2.0 * PI / 60.0), &a * &m_tip)?;
        b.geq(&r, &r_min)?;
        parent.child(b.build()?);

        Ok(Powertrain {
            m,
            p_max,
            p_sp_max,
            rpm_max,
            eta,
            r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_power_fit_is_signomial() {
        let mut wing = ModelBuilder::new("Wing");
        let pt = Powertrain::add_to(&mut wing).unwrap();
        let wing = wing.build().unwrap();
        let node = wing.child("Powertrain").unwrap();
        let signomials: Vec<_> = node
            .constraints()
            .iter()
            .filter(|c| c.is_signomial())
            .collect();
        assert_eq!(signomials.len(), 1);
        assert!(signomials[0].variables().contains(&pt.p_sp_max));
    }

    #[test]
    fn test_fit_constant_unit() {
        let mut wing = ModelBuilder::new("Wing");
        Powertrain::add_to(&mut wing).unwrap();
        let wing = wing.build().unwrap();
        let k = wing.find_variable("Powertrain.k_rpm").unwrap();
        // rpm is 1/60 Hz; the kg exponent survives parsing.
        assert!((k.unit().scale() - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(k.unit().symbol(), "rpm*kg**0.201");
    }
}
