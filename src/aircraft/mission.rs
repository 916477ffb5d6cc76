//! Flight segments and the mission that strings them together.

use crate::atoms::{pow, sum};
use crate::error::Result;
use crate::expr::{var, VarArray, VarKey};
use crate::model::{ModelBuilder, ModelNode};
use crate::solution::Solution;
use crate::units::G0;

use super::aero::WingStrategy;
use super::battery::PowerDraw;
use super::state::FlightState;
use super::vehicle::{Aircraft, AircraftLoading, AircraftPerf};
use super::wing::DEFAULT_STATIONS;
use super::{Objective, WingMode};

/// Stations the ground roll is split into. The last one is liftoff.
pub const TAKEOFF_STATIONS: usize = 4;

/// Flight state and aircraft performance at one ground roll station.
#[derive(Debug, Clone)]
pub struct RollStation {
    pub state: FlightState,
    pub perf: AircraftPerf,
}

/// Ground roll to liftoff within the available runway.
///
/// Station `i` ends at `(i + 1) / TAKEOFF_STATIONS` of the liftoff speed;
/// each interval is flown at the thrust and drag of its end station.
#[derive(Debug, Clone)]
pub struct Takeoff {
    pub stations: Vec<RollStation>,
    /// Speed at the end of each interval.
    pub v: VarArray,
    /// Distance covered in each interval.
    pub s: VarArray,
    pub t: VarArray,
    pub e: VarArray,
    pub v_lof: VarKey,
    /// Total ground roll.
    pub s_to: VarKey,
    pub s_runway: VarKey,
}

impl Takeoff {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        aircraft: &Aircraft,
        strategy: &dyn WingStrategy,
    ) -> Result<Self> {
        let n = TAKEOFF_STATIONS;
        let mut b = ModelBuilder::with_table("Takeoff", parent.table());
        let v = b.array(var("V", "m/s").nominal(20.0).describe("station speed"), n)?;
        let s = b.array(var("S", "m").nominal(60.0).describe("interval distance"), n)?;
        let t = b.array(var("t", "s").nominal(4.0).describe("interval time"), n)?;
        let e = b.array(var("E", "Wh").nominal(80.0).describe("interval energy"), n)?;
        let v_lof = b.var(var("V_lof", "m/s").nominal(30.0).describe("liftoff speed"))?;
        let s_to = b.var(var("S_to", "m").nominal(250.0).describe("ground roll"))?;
        let s_runway = b.var(var("S_runway", "m").value(300.0).describe("runway length"))?;
        let cl_roll = b.var(
            var("CL_roll", "-")
                .value(0.5)
                .describe("lift coefficient during the roll"),
        )?;

        let wing_s = &aircraft.wing.planform.s;
        let mass = &aircraft.mass;
        let mut stations = Vec::with_capacity(n);
        for i in 0..n {
            let mut node = ModelBuilder::with_table(format!("TO{}", i + 1), b.table());
            let state = FlightState::at_speed(&mut node, &v[i])?;
            let perf = AircraftPerf::add_to(&mut node, aircraft, strategy, &state, PowerDraw::Burst)?;
            b.child(node.build()?);

            let fraction = (i + 1) as f64 / n as f64;
            // Speed ratio between the start and the end of the interval.
            let r = i as f64 / (i + 1) as f64;
            let v2 = pow(&v[i], 2.0);

            b.equals(&v[i], fraction * &v_lof)?;
            if i + 1 == n {
                // Liftoff at 1.1 times the stall speed.
                b.geq(
                    0.5 * &state.rho * wing_s * &perf.wing.c_l * &v2,
                    1.21 * G0 * mass,
                )?;
            } else {
                b.geq(&perf.wing.c_l, &cl_roll)?;
            }
            b.geq(
                &perf.wing.t,
                (0.5 * (1.0 - r * r)) * mass * &v2 / &s[i]
                    + 0.5 * &state.rho * wing_s * &perf.cd * &v2,
            )?;
            b.geq(&t[i], (2.0 / (1.0 + r)) * &s[i] / &v[i])?;
            b.geq(&e[i], &perf.p * &t[i] / 3600.0)?;
            stations.push(RollStation { state, perf });
        }
        b.geq(&s_to, sum(s.iter()))?;
        b.leq(&s_to, &s_runway)?;
        parent.child(b.build()?);

        Ok(Takeoff {
            stations,
            v,
            s,
            t,
            e,
            v_lof,
            s_to,
            s_runway,
        })
    }
}

/// Steady climb through a height gain at a bounded flight path angle.
#[derive(Debug, Clone)]
pub struct Climb {
    pub state: FlightState,
    pub perf: AircraftPerf,
    pub h: VarKey,
    /// Horizontal distance covered.
    pub s: VarKey,
    pub t: VarKey,
    pub e: VarKey,
}

impl Climb {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        name: &str,
        aircraft: &Aircraft,
        strategy: &dyn WingStrategy,
        height: f64,
        v_guess: f64,
        draw: PowerDraw,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table(name, parent.table());
        let state = FlightState::add_to(&mut b, v_guess)?;
        let perf = AircraftPerf::add_to(&mut b, aircraft, strategy, &state, draw)?;
        let h = b.var(var("h", "m").value(height).describe("height gained"))?;
        let s = b.var(var("S", "m").nominal(20.0 * height).describe("horizontal distance"))?;
        let t = b.var(var("t", "s").nominal(60.0).describe("climb time"))?;
        let e = b.var(var("E", "Wh").nominal(500.0).describe("energy used"))?;
        let tan_gamma = b.var(
            var("tan_gamma", "-")
                .value(0.5)
                .describe("steepest climb gradient"),
        )?;

        let v2 = pow(&state.v, 2.0);
        let wing_s = &aircraft.wing.planform.s;
        let weight = G0 * &aircraft.mass;

        b.geq(0.5 * &state.rho * wing_s * &perf.wing.c_l * &v2, &weight)?;
        b.geq(
            &perf.wing.t,
            0.5 * &state.rho * wing_s * &perf.cd * &v2 + &weight * &h / &s,
        )?;
        b.leq(&h, &tan_gamma * &s)?;
        b.geq(&t, &s / &state.v)?;
        b.geq(&e, &perf.p * &t / 3600.0)?;
        parent.child(b.build()?);

        Ok(Climb {
            state,
            perf,
            h,
            s,
            t,
            e,
        })
    }
}

/// Steady level cruise on battery energy.
#[derive(Debug, Clone)]
pub struct Cruise {
    pub state: FlightState,
    pub perf: AircraftPerf,
    pub r: VarKey,
    pub t: VarKey,
    pub e: VarKey,
    pub v_ne: VarKey,
}

impl Cruise {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        aircraft: &Aircraft,
        strategy: &dyn WingStrategy,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Cruise", parent.table());
        let state = FlightState::add_to(&mut b, 55.0)?;
        let perf =
            AircraftPerf::add_to(&mut b, aircraft, strategy, &state, PowerDraw::Continuous)?;
        let r = b.var(var("R", "km").nominal(150.0).describe("range"))?;
        let t = b.var(var("t", "hr").nominal(1.0).describe("cruise time"))?;
        let e = b.var(var("E", "Wh").nominal(40_000.0).describe("energy used"))?;
        let v_ne = b.var(var("Vne", "m/s").value(70.0).describe("never-exceed speed"))?;

        let v2 = pow(&state.v, 2.0);
        let s = &aircraft.wing.planform.s;

        b.geq(
            0.5 * &state.rho * s * &perf.wing.c_l * &v2,
            G0 * &aircraft.mass,
        )?;
        b.geq(&perf.wing.t, 0.5 * &state.rho * s * &perf.cd * &v2)?;
        b.leq(&state.v, &v_ne)?;
        b.leq(&r, 3.6 * &state.v * &t)?;
        b.geq(&e, &perf.p * &t)?;
        parent.child(b.build()?);

        Ok(Cruise {
            state,
            perf,
            r,
            t,
            e,
            v_ne,
        })
    }
}

/// Approach at 1.2 times the stall speed and a braked ground roll.
#[derive(Debug, Clone)]
pub struct Landing {
    pub state: FlightState,
    pub perf: AircraftPerf,
    pub s_gr: VarKey,
    pub t: VarKey,
    pub e: VarKey,
}

impl Landing {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        aircraft: &Aircraft,
        strategy: &dyn WingStrategy,
        s_runway: &VarKey,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Landing", parent.table());
        let state = FlightState::add_to(&mut b, 25.0)?;
        let perf =
            AircraftPerf::add_to(&mut b, aircraft, strategy, &state, PowerDraw::Continuous)?;
        let s_gr = b.var(var("S_gr", "m").nominal(100.0).describe("ground roll"))?;
        let t = b.var(var("t", "s").nominal(8.0).describe("ground roll time"))?;
        let e = b.var(var("E", "Wh").nominal(50.0).describe("energy used"))?;
        let mu_brake = b.var(var("mu_brake", "-").value(0.4).describe("braking friction"))?;

        let v2 = pow(&state.v, 2.0);
        let wing_s = &aircraft.wing.planform.s;

        b.geq(
            0.5 * &state.rho * wing_s * &perf.wing.c_l * &v2,
            1.44 * G0 * &aircraft.mass,
        )?;
        b.geq(&perf.wing.t, 0.5 * &state.rho * wing_s * &perf.cd * &v2)?;
        b.geq(&s_gr, &v2 / (2.0 * G0 * &mu_brake))?;
        b.leq(&s_gr, s_runway)?;
        b.geq(&t, 2.0 * &s_gr / &state.v)?;
        b.geq(&e, &perf.p * &t / 3600.0)?;
        parent.child(b.build()?);

        Ok(Landing {
            state,
            perf,
            s_gr,
            t,
            e,
        })
    }
}

/// A complete mission model together with handles to its key variables.
#[derive(Debug, Clone)]
pub struct Mission {
    pub mode: WingMode,
    pub objective: Objective,
    pub root: ModelNode,
    pub aircraft: Aircraft,
    pub takeoff: Takeoff,
    pub obstacle_climb: Climb,
    pub climb: Climb,
    pub cruise: Cruise,
    pub landing: Landing,
    pub loading: AircraftLoading,
    pub f_usable: VarKey,
    /// Required cruise range; only present when minimizing mass.
    pub r_req: Option<VarKey>,
}

impl Mission {
    /// Build the mission with the default spar discretization.
    pub fn build(mode: WingMode, objective: Objective) -> Result<Self> {
        Mission::with_stations(mode, objective, DEFAULT_STATIONS)
    }

    /// Take off, clear a 50 ft obstacle, climb, cruise and land on one
    /// battery charge while the structure carries its sizing loads.
    pub fn with_stations(mode: WingMode, objective: Objective, stations: usize) -> Result<Self> {
        let strategy = mode.strategy();
        let strategy = strategy.as_ref();
        let mut b = ModelBuilder::new("Mission");
        let f_usable = b.var(
            var("f_usable", "-")
                .value(0.9)
                .describe("usable battery energy fraction"),
        )?;

        let aircraft = Aircraft::add_to(&mut b, strategy, stations)?;
        let takeoff = Takeoff::add_to(&mut b, &aircraft, strategy)?;
        let obstacle_climb = Climb::add_to(
            &mut b,
            "ObstacleClimb",
            &aircraft,
            strategy,
            15.24,
            30.0,
            PowerDraw::Burst,
        )?;
        let climb = Climb::add_to(
            &mut b,
            "Climb",
            &aircraft,
            strategy,
            1000.0,
            40.0,
            PowerDraw::Continuous,
        )?;
        let cruise = Cruise::add_to(&mut b, &aircraft, strategy)?;
        let landing = Landing::add_to(&mut b, &aircraft, strategy, &takeoff.s_runway)?;
        let loading = AircraftLoading::add_to(&mut b, &aircraft, &cruise.v_ne)?;

        b.leq(
            sum(takeoff.e.iter()) + &obstacle_climb.e + &climb.e + &cruise.e + &landing.e,
            &f_usable * &aircraft.battery.e,
        )?;
        let r_req = match objective {
            Objective::Range => {
                b.cost(1.0 / &cruise.r);
                None
            }
            Objective::Mass => {
                let r_req = b.var(var("R_req", "km").value(100.0).describe("required range"))?;
                b.geq(&cruise.r, &r_req)?;
                b.cost(&aircraft.mass);
                Some(r_req)
            }
        };
        let root = b.build()?;

        Ok(Mission {
            mode,
            objective,
            root,
            aircraft,
            takeoff,
            obstacle_climb,
            climb,
            cruise,
            landing,
            loading,
            f_usable,
            r_req,
        })
    }

    /// Cruise range of a solution, in km.
    pub fn range_km(&self, solution: &Solution) -> Option<f64> {
        solution.raw(&self.cruise.r)
    }
}
