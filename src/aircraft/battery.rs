//! Battery pack sizing and per-segment power draw.

use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;

/// Which battery power limit a segment is held to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDraw {
    /// Cruise and climb.
    Continuous,
    /// Short takeoff bursts.
    Burst,
}

/// Battery pack. Mass follows from stored energy and peak power.
#[derive(Debug, Clone)]
pub struct Battery {
    pub m: VarKey,
    pub e: VarKey,
    pub estar: VarKey,
    pub eta_pack: VarKey,
    pub p_max_cont: VarKey,
    pub p_max_burst: VarKey,
}

impl Battery {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Battery", parent.table());
        let m = b.var(var("m", "kg").nominal(300.0).describe("battery mass"))?;
        let e = b.var(var("E", "Wh").nominal(60_000.0).describe("stored energy"))?;
        let estar = b.var(
            var("Estar", "Wh/kg")
                .value(200.0)
                .describe("cell specific energy"),
        )?;
        let eta_pack = b.var(var("eta_pack", "-").value(0.8).describe("packing factor"))?;
        let p_max_cont = b.var(
            var("P_max_cont", "W/kg")
                .value(2160.0)
                .describe("continuous specific power"),
        )?;
        let p_max_burst = b.var(
            var("P_max_burst", "W/kg")
                .value(5190.0)
                .describe("burst specific power"),
        )?;

        b.geq(&m, &e / (&eta_pack * &estar))?;
        parent.child(b.build()?);

        Ok(Battery {
            m,
            e,
            estar,
            eta_pack,
            p_max_cont,
            p_max_burst,
        })
    }

    fn power_limit(&self, draw: PowerDraw) -> &VarKey {
        match draw {
            PowerDraw::Continuous => &self.p_max_cont,
            PowerDraw::Burst => &self.p_max_burst,
        }
    }
}

/// Power delivered by the pack in one segment.
#[derive(Debug, Clone)]
pub struct BatteryPerf {
    pub p: VarKey,
    pub draw: PowerDraw,
}

impl BatteryPerf {
    /// `demand` is the electrical power the segment needs, in W.
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        battery: &Battery,
        demand: &VarKey,
        draw: PowerDraw,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Battery", parent.table());
        let p = b.var(var("P", "W").nominal(100_000.0).describe("pack output"))?;
        b.geq(&p, demand)?;
        b.leq(
            &p,
            &battery.m * battery.power_limit(draw) * &battery.eta_pack,
        )?;
        parent.child(b.build()?);
        Ok(BatteryPerf { p, draw })
    }
}
