//! Tail surfaces, the boom that carries them, and their drag and loads.
//!
//! Each tail surface is a small wing with its own planform, skin and spar,
//! sized through a volume coefficient against the main wing. Both surfaces
//! sit at the end of one thin-walled tube boom.

use std::f64::consts::PI;

use crate::atoms::pow;
use crate::error::Result;
use crate::expr::{var, VarKey};
use crate::model::ModelBuilder;
use crate::units::KG_PER_LBF;

use super::state::FlightState;
use super::wing::{Planform, Skin, Spar};

/// Tip to root chord ratio of both tail surfaces.
pub const TAIL_TAPER: f64 = 0.8;

/// Planform, skin and spar shared by both tail surfaces.
#[derive(Debug, Clone)]
pub struct TailSurface {
    pub planform: Planform,
    pub skin: Skin,
    pub spar: Spar,
    pub c_root: VarKey,
    pub cl_max: VarKey,
    /// Structural weight.
    pub w: VarKey,
}

impl TailSurface {
    /// Declare the surface inside the tail node `b`. Aspect ratio and
    /// thickness are pinned by the tail node.
    fn declare(b: &mut ModelBuilder<'_>, stations: usize) -> Result<Self> {
        let w = b.var(var("W", "lbf").nominal(10.0).describe("structural weight"))?;
        let c_root = b.var(var("c_root", "m").nominal(0.7).describe("root chord"))?;
        let cl_max = b.var(var("CLmax", "-").value(3.0).describe("maximum lift coefficient"))?;
        let mfac = b.var(var("mfac", "-").value(1.1).describe("structural margin"))?;

        let planform = Planform::add_to(b)?;
        let skin = Skin::add_to(b, &planform)?;
        let spar = Spar::add_to(b, &planform, stations)?;
        b.substitute(&planform.ar, 4.0);
        b.substitute(&planform.tau, 0.08);

        b.equals(
            &c_root,
            (2.0 / (1.0 + TAIL_TAPER)) * &planform.s / &planform.b,
        )?;
        b.geq(&w, &mfac * (&skin.w + &spar.w))?;

        Ok(TailSurface {
            planform,
            skin,
            spar,
            c_root,
            cl_max,
            w,
        })
    }
}

/// Horizontal tail, sized by `Vh = Sh lh b / S^2` against the wing.
#[derive(Debug, Clone)]
pub struct HorizontalTail {
    pub surface: TailSurface,
    /// Volume coefficient.
    pub v_h: VarKey,
    /// Moment arm.
    pub l_h: VarKey,
}

impl HorizontalTail {
    pub fn add_to(parent: &mut ModelBuilder<'_>, stations: usize) -> Result<Self> {
        let mut b = ModelBuilder::with_table("HTail", parent.table());
        let v_h = b.var(var("Vh", "-").value(0.45).describe("horizontal tail volume coefficient"))?;
        let l_h = b.var(var("lh", "m").nominal(5.0).describe("horizontal tail moment arm"))?;
        let surface = TailSurface::declare(&mut b, stations)?;
        parent.child(b.build()?);
        Ok(HorizontalTail { surface, v_h, l_h })
    }
}

/// Vertical tail, sized by `Vv = Sv lv / (S b)` against the wing.
#[derive(Debug, Clone)]
pub struct VerticalTail {
    pub surface: TailSurface,
    pub v_v: VarKey,
    pub l_v: VarKey,
}

impl VerticalTail {
    pub fn add_to(parent: &mut ModelBuilder<'_>, stations: usize) -> Result<Self> {
        let mut b = ModelBuilder::with_table("VTail", parent.table());
        let v_v = b.var(var("Vv", "-").value(0.04).describe("vertical tail volume coefficient"))?;
        let l_v = b.var(var("lv", "m").nominal(5.0).describe("vertical tail moment arm"))?;
        let surface = TailSurface::declare(&mut b, stations)?;
        parent.child(b.build()?);
        Ok(VerticalTail { surface, v_v, l_v })
    }
}

/// Carbon tube of constant diameter from the fuselage to the tails.
#[derive(Debug, Clone)]
pub struct TailBoom {
    pub l: VarKey,
    /// Outer diameter.
    pub d: VarKey,
    /// Wall thickness.
    pub t: VarKey,
    /// Wetted area.
    pub s: VarKey,
    pub w: VarKey,
    /// Root second moment of area.
    pub i0: VarKey,
    /// Root section modulus.
    pub s_y: VarKey,
    pub e: VarKey,
    pub sigma: VarKey,
}

impl TailBoom {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Boom", parent.table());
        let l = b.var(var("l", "m").nominal(6.0).describe("boom length"))?;
        let d = b.var(var("d", "m").nominal(0.3).describe("boom diameter"))?;
        let t = b.var(var("t", "m").nominal(1.5e-3).describe("wall thickness"))?;
        let s = b.var(var("S", "m^2").nominal(5.0).describe("wetted area"))?;
        let w = b.var(var("W", "lbf").nominal(40.0).describe("boom weight"))?;
        let i0 = b.var(var("I0", "m^4").nominal(4e-5).describe("second moment of area"))?;
        let s_y = b.var(var("Sy", "m^3").nominal(2e-4).describe("section modulus"))?;
        let rho = b.var(var("rho", "kg/m^3").value(1600.0).describe("laminate density"))?;
        let e = b.var(var("E", "Pa").value(6.0e10).describe("laminate modulus"))?;
        let sigma = b.var(var("sigma", "Pa").value(5.0e8).describe("allowable stress"))?;
        let t_min = b.var(var("t_min", "m").value(5e-4))?;

        b.equals(&s, PI * &d * &l)?;
        b.geq(&w, (PI / KG_PER_LBF) * &rho * &d * &t * &l)?;
        b.leq(&i0, (PI / 8.0) * pow(&d, 3.0) * &t)?;
        b.leq(&s_y, (PI / 4.0) * pow(&d, 2.0) * &t)?;
        b.geq(&t, &t_min)?;
        parent.child(b.build()?);

        Ok(TailBoom {
            l,
            d,
            t,
            s,
            w,
            i0,
            s_y,
            e,
            sigma,
        })
    }
}

/// Profile drag of a tail surface in one flight state.
#[derive(Debug, Clone)]
pub struct TailPerf {
    pub re: VarKey,
    /// Drag coefficient on the surface's own area.
    pub cd: VarKey,
}

impl TailPerf {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        name: &str,
        surface: &TailSurface,
        state: &FlightState,
    ) -> Result<Self> {
        let planform = &surface.planform;
        let mut b = ModelBuilder::with_table(name, parent.table());
        let re = b.var(var("Re", "-").nominal(1e6).describe("chord Reynolds number"))?;
        let cd = b.var(var("Cd", "-").nominal(0.01).describe("profile drag coefficient"))?;

        b.equals(
            &re,
            &state.v * &state.rho * &planform.s / (&planform.b * &state.mu),
        )?;
        // Max-affine fit of thin symmetric sections over Reynolds number
        // and thickness.
        let fits = [
            (0.339937756, -0.181990628, 0.774603933),
            (5.446864658, -0.484866619, 0.246341522),
            (16.2594679, -0.539943202, 0.466384455),
            (9.509193806, -0.482346958, 0.467466389),
            (218.7365501, -0.603870895, 1.312443752),
        ];
        for (k, a, t) in fits {
            b.geq(&cd, k * pow(&re, a) * pow(&planform.tau, t))?;
        }
        parent.child(b.build()?);

        Ok(TailPerf { re, cd })
    }
}

/// Skin friction of the boom in one flight state.
#[derive(Debug, Clone)]
pub struct TailBoomPerf {
    pub re: VarKey,
    pub c_f: VarKey,
}

impl TailBoomPerf {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        boom: &TailBoom,
        state: &FlightState,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Boom", parent.table());
        let re = b.var(var("Re", "-").nominal(2e7).describe("length Reynolds number"))?;
        let c_f = b.var(var("C_f", "-").nominal(0.003).describe("skin friction coefficient"))?;

        b.equals(&re, &state.v * &state.rho * &boom.l / &state.mu)?;
        b.geq(&c_f, 0.455 * pow(&re, -0.3))?;
        parent.child(b.build()?);

        Ok(TailBoomPerf { re, c_f })
    }
}

/// The boom bending under a tail's maximum load at the never-exceed speed.
/// The root moment is held to the allowable stress and the tip slope to
/// `kappa`.
#[derive(Debug, Clone)]
pub struct TailBoomBending {
    /// Tail force.
    pub f: VarKey,
    /// Root bending moment.
    pub m_r: VarKey,
    /// Tip deflection angle.
    pub th: VarKey,
    pub kappa: VarKey,
}

impl TailBoomBending {
    /// `q_ne` is the dynamic pressure at the never-exceed speed.
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        name: &str,
        boom: &TailBoom,
        tail: &TailSurface,
        q_ne: &VarKey,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table(name, parent.table());
        let f = b.var(var("F", "N").nominal(4000.0).describe("tail force"))?;
        let m_r = b.var(var("Mr", "N*m").nominal(2e4).describe("root moment"))?;
        let th = b.var(var("th", "-").nominal(0.03).describe("tip deflection angle"))?;
        let kappa = b.var(var("kappa", "-").value(0.1).describe("maximum deflection"))?;
        let n_safety = b.var(var("Nsafety", "-").value(1.0).describe("safety load factor"))?;

        b.geq(&f, q_ne * &tail.planform.s)?;
        b.geq(&m_r, &f * &boom.l)?;
        b.leq(&m_r, &boom.sigma * &boom.s_y)?;
        // Cantilever with an end load.
        b.geq(&th, &f * pow(&boom.l, 2.0) / (2.0 * &boom.e * &boom.i0))?;
        b.leq(&th * &tail.cl_max * &n_safety, &kappa)?;
        parent.child(b.build()?);

        Ok(TailBoomBending { f, m_r, th, kappa })
    }
}
