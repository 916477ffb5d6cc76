//! Wing structure: planform, skin, a per-station spar and its loading.
//!
//! The spar is discretized into `stations` spanwise stations from root
//! (index 0) to tip. Shear and bending moment are integrated inward from
//! the tip with the trapezoid rule; each segment between two stations
//! carries a pair of spar caps sized by the bending stress at its inboard
//! station.

use std::f64::consts::PI;

use crate::atoms::{pow, sum};
use crate::error::{Result, SizingError};
use crate::expr::{var, Monomial, VarArray, VarKey};
use crate::model::ModelBuilder;
use crate::units::KG_PER_LBF;

use super::aero::WingStrategy;
use super::powertrain::Powertrain;
use super::WingMode;

/// Spanwise stations used by [`Wing::add_to`] callers that do not care.
pub const DEFAULT_STATIONS: usize = 5;

#[derive(Debug, Clone)]
pub struct Planform {
    pub s: VarKey,
    pub ar: VarKey,
    pub b: VarKey,
    /// Mean chord.
    pub c: VarKey,
    /// Thickness-to-chord ratio.
    pub tau: VarKey,
}

impl Planform {
    pub fn add_to(parent: &mut ModelBuilder<'_>) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Planform", parent.table());
        let s = b.var(var("S", "m^2").nominal(14.0).describe("reference area"))?;
        let ar = b.var(var("AR", "-").nominal(10.0).describe("aspect ratio"))?;
        let span = b.var(var("b", "m").nominal(12.0).describe("span"))?;
        let c = b.var(var("c", "m").nominal(1.2).describe("mean chord"))?;
        let tau = b.var(var("tau", "-").value(0.12))?;

        b.equals(pow(&span, 2.0), &s * &ar)?;
        b.equals(&c * &span, &s)?;
        parent.child(b.build()?);

        Ok(Planform {
            s,
            ar,
            b: span,
            c,
            tau,
        })
    }
}

/// Composite skin of uniform thickness over both surfaces.
#[derive(Debug, Clone)]
pub struct Skin {
    pub w: VarKey,
    pub t: VarKey,
}

impl Skin {
    pub fn add_to(parent: &mut ModelBuilder<'_>, planform: &Planform) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Skin", parent.table());
        let w = b.var(var("W", "lbf").nominal(50.0).describe("skin weight"))?;
        let t = b.var(var("t", "m").nominal(5e-4).describe("skin thickness"))?;
        let rho = b.var(var("rho", "kg/m^3").value(1600.0).describe("fabric density"))?;
        let t_min = b.var(var("t_min", "m").value(5e-4))?;

        b.geq(&w, (2.0 / KG_PER_LBF) * &rho * &planform.s * &t)?;
        b.geq(&t, &t_min)?;
        parent.child(b.build()?);

        Ok(Skin { w, t })
    }
}

/// Cap spar discretized into spanwise segments.
#[derive(Debug, Clone)]
pub struct Spar {
    /// Combined cap area of each segment, root first.
    pub a_cap: VarArray,
    /// Cap mass of each segment of one half-wing.
    pub dm: VarArray,
    /// Spar depth.
    pub hin: VarKey,
    pub w: VarKey,
    pub sigma: VarKey,
    pub stations: usize,
}

impl Spar {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        planform: &Planform,
        stations: usize,
    ) -> Result<Self> {
        if stations < 2 {
            return Err(SizingError::InvalidModel(format!(
                "spar needs at least two stations, got {stations}"
            )));
        }
        let segments = stations - 1;
        let deta = 1.0 / segments as f64;

        let mut b = ModelBuilder::with_table("Spar", parent.table());
        let a_cap = b.array(var("A_cap", "m^2").nominal(2e-4), segments)?;
        let dm = b.array(var("dm", "kg").nominal(2.0), segments)?;
        let hin = b.var(var("hin", "m").nominal(0.15).describe("spar depth"))?;
        let w = b.var(var("W", "lbf").nominal(20.0).describe("spar weight"))?;
        let rho = b.var(var("rho", "kg/m^3").value(1760.0).describe("cap density"))?;
        let sigma = b.var(
            var("sigma", "Pa")
                .value(1.0e9)
                .describe("allowable cap stress"),
        )?;

        b.leq(&hin, &planform.tau * &planform.c)?;
        for i in 0..segments {
            b.geq(&dm[i], deta * &rho * &a_cap[i] * &planform.b)?;
        }
        b.geq(&w, (2.0 / KG_PER_LBF) * sum(dm.iter()))?;
        parent.child(b.build()?);

        Ok(Spar {
            a_cap,
            dm,
            hin,
            w,
            sigma,
            stations,
        })
    }

    pub fn segments(&self) -> usize {
        self.stations - 1
    }
}

/// Wing structure with its propulsors.
#[derive(Debug, Clone)]
pub struct Wing {
    pub mode: WingMode,
    pub planform: Planform,
    pub skin: Skin,
    pub spar: Spar,
    pub powertrain: Powertrain,
    pub n_prop: VarKey,
    /// Structural weight.
    pub w: VarKey,
    /// Structure plus motors.
    pub m: VarKey,
}

impl Wing {
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        strategy: &dyn WingStrategy,
        stations: usize,
    ) -> Result<Self> {
        let mut b = ModelBuilder::with_table("Wing", parent.table());
        let w = b.var(var("W", "lbf").nominal(80.0).describe("structural weight"))?;
        let m = b.var(var("m", "kg").nominal(70.0).describe("wing system mass"))?;
        let n_prop = b.var(
            var("n_prop", "-")
                .value(strategy.propellers())
                .describe("propellers on the wing"),
        )?;
        let mfac = b.var(var("mfac", "-").value(1.2).describe("structural margin"))?;

        let planform = Planform::add_to(&mut b)?;
        let skin = Skin::add_to(&mut b, &planform)?;
        let spar = Spar::add_to(&mut b, &planform, stations)?;
        let powertrain = Powertrain::add_to(&mut b)?;

        b.geq(&w, &mfac * (&skin.w + &spar.w))?;
        b.geq(&m, &n_prop * &powertrain.m + KG_PER_LBF * &w)?;
        parent.child(b.build()?);

        Ok(Wing {
            mode: strategy.mode(),
            planform,
            skin,
            spar,
            powertrain,
            n_prop,
            w,
            m,
        })
    }
}

/// Roughly elliptic spanwise lift shape, root first, averaging about one.
/// The tip value is floored so every station stays positive.
pub fn elliptic_load(stations: usize) -> Vec<f64> {
    let segments = stations.saturating_sub(1).max(1) as f64;
    (0..stations)
        .map(|i| {
            let eta = i as f64 / segments;
            (4.0 / PI * (1.0 - eta * eta).max(0.0).sqrt()).max(0.05)
        })
        .collect()
}

/// Shear and bending moment along a spar at its sizing load.
#[derive(Debug, Clone)]
pub struct SparLoading {
    pub q: VarArray,
    pub shear: VarArray,
    pub moment: VarArray,
    pub n_max: VarKey,
    /// Spanwise load shape constant.
    pub qbar: VarArray,
}

impl SparLoading {
    /// Add a node `name` that carries `n_max` times the total lift `load`
    /// along the span of `planform` and sizes the caps of `spar`.
    pub fn add_to(
        parent: &mut ModelBuilder<'_>,
        name: &str,
        planform: &Planform,
        spar: &Spar,
        load: impl Into<Monomial>,
        n_max: f64,
    ) -> Result<Self> {
        let n = spar.stations;
        let deta = 1.0 / spar.segments() as f64;
        let span = &planform.b;

        let mut b = ModelBuilder::with_table(name, parent.table());
        let q = b.array(var("q", "N/m").nominal(5000.0).describe("running load"), n)?;
        let shear = b.array(var("S", "N").nominal(2e4).describe("shear"), n)?;
        let moment = b.array(var("M", "N*m").nominal(3e4).describe("bending moment"), n)?;
        let qbar = b.array(
            var("qbar", "-")
                .values(elliptic_load(n))
                .describe("spanwise load shape"),
            n,
        )?;
        let n_max = b.var(var("Nmax", "-").value(n_max).describe("sizing load factor"))?;
        let s_tip = b.var(var("S_tip", "N").value(1.0))?;
        let m_tip = b.var(var("M_tip", "N*m").value(1.0))?;

        let load: Monomial = load.into();
        let per_span = &n_max * &load / span;
        for i in 0..n {
            b.geq(&q[i], &per_span * &qbar[i])?;
        }
        for i in 0..n - 1 {
            b.geq(
                &shear[i],
                &shear[i + 1] + (0.25 * deta) * span * (&q[i] + &q[i + 1]),
            )?;
            b.geq(
                &moment[i],
                &moment[i + 1] + (0.25 * deta) * span * (&shear[i] + &shear[i + 1]),
            )?;
            b.leq(&moment[i], &spar.sigma * &spar.a_cap[i] * &spar.hin)?;
        }
        b.geq(&shear[n - 1], &s_tip)?;
        b.geq(&moment[n - 1], &m_tip)?;
        parent.child(b.build()?);

        Ok(SparLoading {
            q,
            shear,
            moment,
            n_max,
            qbar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::aero::ConventionalWing;
    use crate::expr::Declared;
    use crate::units::G0;

    #[test]
    fn test_elliptic_load_shape() {
        let shape = elliptic_load(5);
        assert_eq!(shape.len(), 5);
        assert!((shape[0] - 4.0 / PI).abs() < 1e-12);
        assert_eq!(shape[4], 0.05);
        assert!(shape.windows(2).all(|w| w[0] >= w[1]));
        // Trapezoid mean over the half-span is close to one.
        let mean = 0.25 * (0.5 * shape[0] + shape[1] + shape[2] + shape[3] + 0.5 * shape[4]);
        assert!((mean - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_spar_stations() {
        let mut root = ModelBuilder::new("Aircraft");
        let wing = Wing::add_to(&mut root, &ConventionalWing, 7).unwrap();
        let mass = root.var(var("mass", "kg")).unwrap();
        let loading =
            SparLoading::add_to(&mut root, "Loading", &wing.planform, &wing.spar, G0 * &mass, 5.0)
                .unwrap();
        let root = root.build().unwrap();

        assert_eq!(wing.spar.a_cap.len(), 6);
        assert_eq!(loading.moment.len(), 7);
        assert_eq!(loading.n_max.declared(), &Declared::Fixed(5.0));
        assert_eq!(root.find_array("Wing.Spar.dm").unwrap().len(), 6);
        assert_eq!(root.find_array("Loading.qbar").unwrap().len(), 7);
        assert!(matches!(loading.qbar[6].declared(), Declared::Fixed(v) if *v == 0.05));
        // One load, shear, moment and stress row per station or segment.
        let node = root.child("Loading").unwrap();
        assert_eq!(node.constraints().len(), 7 + 3 * 6 + 2);
    }

    #[test]
    fn test_spar_needs_two_stations() {
        let mut root = ModelBuilder::new("Aircraft");
        let err = Wing::add_to(&mut root, &ConventionalWing, 1).unwrap_err();
        assert!(matches!(err, SizingError::InvalidModel(_)));
    }
}
