//! Whole-aircraft mass roll-up, per-segment performance and the
//! structural load cases.

use crate::atoms::pow;
use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;
use crate::units::{G0, KG_PER_LBF};

use super::aero::{WingPerf, WingStrategy};
use super::battery::{Battery, BatteryPerf, PowerDraw};
use super::fuselage::{Equipment, Fuselage, FuselagePerf, Gear};
use super::state::FlightState;
use super::tail::{
    HorizontalTail, TailBoom, TailBoomBending, TailBoomPerf, TailPerf, VerticalTail,
};
use super::wing::{SparLoading, Wing};

/// The vehicle: components plus gross mass.
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub mass: VarKey,
    pub mtow: VarKey,
    pub battery: Battery,
    pub wing: Wing,
    pub fuselage: Fuselage,
    pub gear: Gear,
    pub equipment: Equipment,
    pub htail: HorizontalTail,
    pub vtail: VerticalTail,
    pub boom: TailBoom,
    pub payload: VarKey,
}

impl Aircraft {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        strategy: &dyn WingStrategy,
        stations: usize,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Aircraft", parent.table());
        let mass = b.var(var("mass", "kg").nominal(1000.0).describe("gross mass"))?;
        let mtow = b.var(var("mtow", "kg").value(1000.0).describe("maximum takeoff mass"))?;
        let payload = b.var(var("m_payload", "kg").nominal(192.0))?;
        let n_pax = b.var(var("n_pax", "-").value(2.0))?;
        let m_pax = b.var(var("m_pax", "kg").value(86.0).describe("mass per passenger"))?;
        let m_baggage = b.var(var("m_baggage", "kg").value(10.0))?;
        let w_cabin = b.var(
            var("w_cabin", "m")
                .value(1.27)
                .describe("span kept clear of propellers"),
        )?;

        let battery = Battery::add_to(&mut b)?;
        let wing = Wing::add_to(&mut b, strategy, stations)?;
        let fuselage = Fuselage::add_to(&mut b)?;
        let gear = Gear::add_to(&mut b)?;
        let equipment = Equipment::add_to(&mut b)?;
        let htail = HorizontalTail::add_to(&mut b, stations)?;
        let vtail = VerticalTail::add_to(&mut b, stations)?;
        let boom = TailBoom::add_to(&mut b)?;
        let planform = &wing.planform;
        let (sh, sv) = (&htail.surface.planform.s, &vtail.surface.planform.s);

        b.geq(&payload, &n_pax * (&m_pax + &m_baggage))?;
        b.geq(&fuselage.m, 0.14 * &mass)?;
        b.geq(&gear.m, 0.04 * &mass)?;
        b.geq(&equipment.m, 0.15 * &mass)?;
        b.equals(&gear.l, 0.16 * &fuselage.l)?;
        b.equals(
            &htail.v_h,
            sh * &htail.l_h * &planform.b / pow(&planform.s, 2.0),
        )?;
        b.equals(&vtail.v_v, sv * &vtail.l_v / (&planform.s * &planform.b))?;
        b.geq(&boom.l, &htail.l_h + &htail.surface.c_root)?;
        b.geq(&boom.l, &vtail.l_v + &vtail.surface.c_root)?;
        b.geq(
            &mass,
            &wing.m
                + &fuselage.m
                + &gear.m
                + &equipment.m
                + &battery.m
                + &payload
                + KG_PER_LBF * (&boom.w + &htail.surface.w + &vtail.surface.w),
        )?;
        b.leq(&mass, &mtow)?;
        b.geq(
            &wing.planform.b,
            &w_cabin + 2.0 * &wing.n_prop * &wing.powertrain.r,
        )?;
        parent.child(b.build()?);

        Ok(Aircraft {
            mass,
            mtow,
            battery,
            wing,
            fuselage,
            gear,
            equipment,
            htail,
            vtail,
            boom,
            payload,
        })
    }
}

/// The aircraft's drag, power and battery draw in one flight state.
#[derive(Debug, Clone)]
pub struct AircraftPerf {
    pub wing: WingPerf,
    pub fuselage: FuselagePerf,
    pub battery: BatteryPerf,
    pub htail: TailPerf,
    pub vtail: TailPerf,
    pub boom: TailBoomPerf,
    /// Electrical power drawn.
    pub p: VarKey,
    /// Drag coefficient on the wing reference area.
    pub cd: VarKey,
    pub l_d: VarKey,
}

impl AircraftPerf {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        aircraft: &Aircraft,
        strategy: &dyn WingStrategy,
        state: &FlightState,
        draw: PowerDraw,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Perf", parent.table());
        let p = b.var(var("P", "W").nominal(60_000.0).describe("electrical power"))?;
        let cd = b.var(var("CD", "-").nominal(0.03).describe("total drag coefficient"))?;
        let l_d = b.var(var("L_D", "-").nominal(15.0).describe("lift to drag ratio"))?;
        let p_avionics = b.var(var("P_avionics", "W").value(250.0))?;

        let wing = strategy.add_performance(&mut b, &aircraft.wing, state)?;
        let fuselage = FuselagePerf::add_to(&mut b, &aircraft.fuselage, state)?;
        let battery = BatteryPerf::add_to(&mut b, &aircraft.battery, &p, draw)?;
        let htail = TailPerf::add_to(&mut b, "HTail", &aircraft.htail.surface, state)?;
        let vtail = TailPerf::add_to(&mut b, "VTail", &aircraft.vtail.surface, state)?;
        let boom = TailBoomPerf::add_to(&mut b, &aircraft.boom, state)?;

        b.geq(&p, &wing.p + &p_avionics)?;
        // Component drag referenced to the wing area.
        let s = &aircraft.wing.planform.s;
        b.geq(
            &cd,
            &wing.c_d
                + &fuselage.cd * &aircraft.fuselage.s_wet / s
                + &htail.cd * &aircraft.htail.surface.planform.s / s
                + &vtail.cd * &aircraft.vtail.surface.planform.s / s
                + &boom.c_f * &aircraft.boom.s / s,
        )?;
        b.equals(&l_d, &wing.c_l / &cd)?;
        parent.child(b.build()?);

        Ok(AircraftPerf {
            wing,
            fuselage,
            battery,
            htail,
            vtail,
            boom,
            p,
            cd,
            l_d,
        })
    }
}

/// Structural load cases: the wing at its maneuver load factor and each
/// tail at full lift at the never-exceed speed.
#[derive(Debug, Clone)]
pub struct AircraftLoading {
    pub wing: SparLoading,
    pub htail: SparLoading,
    pub vtail: SparLoading,
    pub hboom: TailBoomBending,
    pub vboom: TailBoomBending,
    /// Dynamic pressure at the never-exceed speed.
    pub q_ne: VarKey,
}

impl AircraftLoading {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        aircraft: &Aircraft,
        v_ne: &VarKey,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Loading", parent.table());
        let q_ne = b.var(var("q_ne", "Pa").nominal(3000.0).describe("never-exceed dynamic pressure"))?;
        let rho = b.var(var("rho", "kg/m^3").value(1.225).describe("air density"))?;
        b.geq(&q_ne, 0.5 * &rho * pow(v_ne, 2.0))?;

        let wing = SparLoading::add_to(
            &mut b,
            "Wing",
            &aircraft.wing.planform,
            &aircraft.wing.spar,
            G0 * &aircraft.mass,
            5.0,
        )?;
        let (h, v) = (&aircraft.htail.surface, &aircraft.vtail.surface);
        let htail = SparLoading::add_to(
            &mut b,
            "HTail",
            &h.planform,
            &h.spar,
            &q_ne * &h.planform.s * &h.cl_max,
            1.0,
        )?;
        let vtail = SparLoading::add_to(
            &mut b,
            "VTail",
            &v.planform,
            &v.spar,
            &q_ne * &v.planform.s * &v.cl_max,
            1.0,
        )?;
        let hboom = TailBoomBending::add_to(&mut b, "HBoom", &aircraft.boom, h, &q_ne)?;
        let vboom = TailBoomBending::add_to(&mut b, "VBoom", &aircraft.boom, v, &q_ne)?;
        parent.child(b.build()?);

        Ok(AircraftLoading {
            wing,
            htail,
            vtail,
            hboom,
            vboom,
            q_ne,
        })
    }
}
