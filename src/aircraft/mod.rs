//! Sizing models for a small battery-electric aircraft.
//!
//! Each sub-model is attached to a parent [`ModelBuilder`](crate::model::ModelBuilder)
//! with an `add_to` constructor that returns typed handles to its variables.
//! [`Mission`] assembles the whole tree and either maximizes cruise range
//! or minimizes gross mass for a required range, per [`Objective`].
//!
//! Values are in the unit each variable declares. Structural weights are in
//! lbf and are converted to mass with [`KG_PER_LBF`](crate::units::KG_PER_LBF).
//!
//! ```no_run
//! use gpsize::aircraft::{Mission, Objective, WingMode};
//! use gpsize::model::Substitutions;
//! use gpsize::problem::SpSolver;
//!
//! # fn main() -> gpsize::Result<()> {
//! let mission = Mission::build(WingMode::Blown, Objective::Range)?;
//! let solution = SpSolver::default().solve_model(&mission.root, &Substitutions::new())?;
//! println!("range: {:.0} km", mission.range_km(&solution).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod aero;
pub mod battery;
pub mod fuselage;
pub mod mission;
pub mod powertrain;
pub mod state;
pub mod tail;
pub mod vehicle;
pub mod wing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use aero::{BlownWing, ConventionalWing, WingPerf, WingStrategy};
pub use battery::{Battery, BatteryPerf, PowerDraw};
pub use fuselage::{Equipment, Fuselage, FuselagePerf, Gear};
pub use mission::{Climb, Cruise, Landing, Mission, Takeoff, TAKEOFF_STATIONS};
pub use powertrain::Powertrain;
pub use state::FlightState;
pub use tail::{
    HorizontalTail, TailBoom, TailBoomBending, TailBoomPerf, TailPerf, TailSurface, VerticalTail,
};
pub use vehicle::{Aircraft, AircraftLoading, AircraftPerf};
pub use wing::{Planform, Skin, Spar, SparLoading, Wing};

/// Wing configuration of the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WingMode {
    #[default]
    Conventional,
    Blown,
}

impl WingMode {
    pub fn strategy(self) -> Box<dyn WingStrategy> {
        match self {
            WingMode::Conventional => Box::new(ConventionalWing),
            WingMode::Blown => Box::new(BlownWing),
        }
    }
}

impl fmt::Display for WingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WingMode::Conventional => "conventional",
            WingMode::Blown => "blown",
        })
    }
}

impl FromStr for WingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conventional" => Ok(WingMode::Conventional),
            "blown" => Ok(WingMode::Blown),
            other => Err(format!(
                "unknown wing mode '{other}', expected 'conventional' or 'blown'"
            )),
        }
    }
}

/// What the mission optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Maximize cruise range at the fixed takeoff mass limit.
    #[default]
    Range,
    /// Minimize gross mass for a required cruise range.
    Mass,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Objective::Range => "range",
            Objective::Mass => "mass",
        })
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "range" => Ok(Objective::Range),
            "mass" => Ok(Objective::Mass),
            other => Err(format!("unknown objective '{other}', expected 'range' or 'mass'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wing_mode_parse() {
        assert_eq!("Blown".parse::<WingMode>(), Ok(WingMode::Blown));
        assert_eq!(WingMode::default().to_string(), "conventional");
        assert!("canard".parse::<WingMode>().is_err());
        assert_eq!(WingMode::Blown.strategy().mode(), WingMode::Blown);
    }

    #[test]
    fn test_objective_parse() {
        assert_eq!("MASS".parse::<Objective>(), Ok(Objective::Mass));
        assert_eq!(Objective::default().to_string(), "range");
        assert!("speed".parse::<Objective>().is_err());
    }
}
