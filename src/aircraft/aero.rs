//! Wing aerodynamics and propulsion in one flight state.
//!
//! A [`WingStrategy`] adds the lift, drag, thrust and power relations of a
//! wing configuration to a segment. The conventional wing has a single
//! tractor propeller; the blown wing spreads propellers along the leading
//! edge and gains lift from the accelerated jet, which makes its lift and
//! induced-drag relations signomial.

use std::f64::consts::PI;
use std::fmt;

use crate::atoms::pow;
use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;

use super::state::FlightState;
use super::wing::Wing;
use super::WingMode;

/// Coefficients and power of a wing in one flight state.
#[derive(Debug, Clone)]
pub struct WingPerf {
    pub c_l: VarKey,
    pub c_d: VarKey,
    /// Total propeller thrust.
    pub t: VarKey,
    /// Shaft power of all motors.
    pub p: VarKey,
}

/// Aerodynamic and propulsive model of one wing configuration.
pub trait WingStrategy: fmt::Debug + Send + Sync {
    fn mode(&self) -> WingMode;

    /// Number of propellers mounted on the wing.
    fn propellers(&self) -> f64;

    /// Add a `Wing` child to `parent` holding this configuration's
    /// relations for `state`.
    fn add_performance(
        &self,
        parent: &mut ModelBuilder<'_>,
        wing: &Wing,
        state: &FlightState,
    ) -> Result<WingPerf>;
}

/// Turbulent flat-plate profile drag. Returns `C_Dp`.
fn profile_drag(b: &mut ModelBuilder<'_>, wing: &Wing, state: &FlightState) -> Result<VarKey> {
    let planform = &wing.planform;
    let re = b.var(var("Re", "-").nominal(5e6).describe("chord Reynolds number"))?;
    let c_f = b.var(var("C_f", "-").nominal(0.004).describe("skin friction coefficient"))?;
    let c_dp = b.var(var("C_Dp", "-").nominal(0.01).describe("profile drag coefficient"))?;
    let mfac = b.var(var("mfac", "-").value(1.2).describe("friction margin"))?;
    let kf = b.var(var("Kf", "-").value(1.18).describe("form factor"))?;

    b.equals(
        pow(&c_f, 5.0) * &re,
        0.074_f64.powi(5) * pow(&mfac, 5.0),
    )?;
    b.equals(&c_dp, 2.1 * &kf * &c_f)?;
    b.equals(
        &re,
        &state.v * &state.rho * pow(&planform.s / &planform.ar, 0.5) / &state.mu,
    )?;
    Ok(c_dp)
}

/// Unblown wing driven by a single propeller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalWing;

impl WingStrategy for ConventionalWing {
    fn mode(&self) -> WingMode {
        WingMode::Conventional
    }

    fn propellers(&self) -> f64 {
        1.0
    }

    fn add_performance(
        &self,
        parent: &mut ModelBuilder<'_>,
        wing: &Wing,
        state: &FlightState,
    ) -> Result<WingPerf> {
        let pt = &wing.powertrain;
        let mut b = ModelBuilder::with_table("Wing", parent.table());
        let c_l = b.var(var("C_L", "-").nominal(0.6).describe("lift coefficient"))?;
        let c_di = b.var(var("C_Di", "-").nominal(0.01).describe("induced drag coefficient"))?;
        let c_d = b.var(var("C_D", "-").nominal(0.02).describe("wing drag coefficient"))?;
        let t = b.var(var("T", "N").nominal(1500.0).describe("thrust"))?;
        let p = b.var(var("P", "W").nominal(60_000.0).describe("shaft power"))?;
        let cl_max = b.var(var("CLmax", "-").value(2.0))?;
        let e = b.var(var("e", "-").value(0.8).describe("span efficiency"))?;
        let eta_prop = b.var(var("eta_prop", "-").value(0.8))?;

        let c_dp = profile_drag(&mut b, wing, state)?;
        b.leq(&c_l, &cl_max)?;
        b.geq(PI * &c_di * &wing.planform.ar * &e, pow(&c_l, 2.0))?;
        b.geq(&c_d, &c_di + &c_dp)?;
        b.geq(&p, &t * &state.v / (&eta_prop * &pt.eta))?;
        b.leq(&p, &wing.n_prop * &pt.p_max)?;
        parent.child(b.build()?);

        Ok(WingPerf { c_l, c_d, t, p })
    }
}

/// Distributed propellers blowing the wing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlownWing;

impl WingStrategy for BlownWing {
    fn mode(&self) -> WingMode {
        WingMode::Blown
    }

    fn propellers(&self) -> f64 {
        10.0
    }

    fn add_performance(
        &self,
        parent: &mut ModelBuilder<'_>,
        wing: &Wing,
        state: &FlightState,
    ) -> Result<WingPerf> {
        let pt = &wing.powertrain;
        let planform = &wing.planform;
        let v = &state.v;

        let mut b = ModelBuilder::with_table("Wing", parent.table());
        let c_l = b.var(var("C_L", "-").nominal(1.0).describe("lift coefficient"))?;
        let c_lc = b.var(var("C_LC", "-").nominal(2.0).describe("circulation lift coefficient"))?;
        let c_j = b.var(var("C_J", "-").nominal(1.0).describe("jet momentum coefficient"))?;
        let c_di = b.var(var("C_Di", "-").nominal(0.01).describe("induced drag coefficient"))?;
        let c_d = b.var(var("C_D", "-").nominal(0.02).describe("wing drag coefficient"))?;
        let t = b.var(var("T", "N").nominal(1500.0).describe("thrust"))?;
        let p = b.var(var("P", "W").nominal(60_000.0).describe("shaft power"))?;
        let u_j = b.var(var("u_j", "m/s").nominal(50.0).describe("jet velocity"))?;
        let h = b.var(var("h", "m").nominal(0.6).describe("jet height"))?;
        let a_disk = b.var(var("A_disk", "m^2").nominal(5.0).describe("total disk area"))?;
        let clc_max = b.var(var("CLCmax", "-").value(3.5))?;
        let e = b.var(var("e", "-").value(0.8).describe("span efficiency"))?;
        let eta_prop = b.var(var("eta_prop", "-").value(0.8))?;

        let c_dp = profile_drag(&mut b, wing, state)?;

        b.equals(&a_disk, PI * &wing.n_prop * pow(&pt.r, 2.0))?;
        b.equals(&h, (PI / 2.0) * &pt.r)?;
        // Actuator-disk momentum balance.
        b.signomial_leq(
            pow(&u_j / v, 2.0),
            2.0 * &t / (&a_disk * &state.rho * pow(v, 2.0)) + 1.0,
        )?;
        b.geq(&u_j, v)?;
        b.geq(&p * &eta_prop * &pt.eta, 0.5 * &t * (&u_j + v))?;
        b.leq(&p, &wing.n_prop * &pt.p_max)?;
        b.equals(&c_j * pow(v, 2.0) * &planform.c, 2.0 * pow(&u_j, 2.0) * &h)?;
        b.signomial_leq(
            &c_l,
            &c_lc + (2.0 / PI) * &c_lc * &c_j / (&planform.ar * &e),
        )?;
        b.leq(&c_lc, &clc_max)?;
        b.signomial_geq(
            &c_di * (PI * &planform.ar * &e + 2.0 * &c_j),
            pow(&c_l, 2.0),
        )?;
        b.geq(&c_d, &c_di + &c_dp)?;
        parent.child(b.build()?);

        Ok(WingPerf { c_l, c_d, t, p })
    }
}
