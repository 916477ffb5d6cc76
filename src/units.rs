//! Physical units.
//!
//! A [`Unit`] carries its own dimension exponents and scale to SI, so two
//! units can be compared and converted without consulting any registry.
//! Parsing unit strings goes through an explicit [`UnitTable`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Result, SizingError};

/// Kilograms of mass per pound-force of weight at standard gravity.
///
/// The single conversion used wherever a weight in lbf enters a mass balance.
pub const KG_PER_LBF: f64 = 0.453_592_37;

/// Standard gravity in m/s^2.
pub const G0: f64 = 9.806_65;

const NDIM: usize = 5;
const DIM_TOL: f64 = 1e-9;

/// A physical unit: SI dimension exponents (kg, m, s, K, A) and a scale to SI.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    dims: [f64; NDIM],
    scale: f64,
    symbol: String,
}

impl Unit {
    /// The dimensionless unit.
    pub fn dimensionless() -> Self {
        Unit {
            dims: [0.0; NDIM],
            scale: 1.0,
            symbol: "-".into(),
        }
    }

    fn base(symbol: &str, dims: [f64; NDIM], scale: f64) -> Self {
        Unit {
            dims,
            scale,
            symbol: symbol.into(),
        }
    }

    /// Display symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Multiplicative factor from this unit to SI.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Check whether this unit has no dimension.
    pub fn is_dimensionless(&self) -> bool {
        self.dims.iter().all(|d| d.abs() < DIM_TOL)
    }

    /// Check whether values in `self` can be converted to `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims
            .iter()
            .zip(other.dims.iter())
            .all(|(a, b)| (a - b).abs() < DIM_TOL)
    }

    /// Factor that converts a magnitude in `self` into a magnitude in `target`.
    pub fn conversion_to(&self, target: &Unit) -> Option<f64> {
        self.is_compatible(target).then(|| self.scale / target.scale)
    }

    /// Product of two units.
    pub fn times(&self, other: &Unit) -> Unit {
        let mut dims = self.dims;
        for (d, o) in dims.iter_mut().zip(other.dims.iter()) {
            *d += o;
        }
        Unit {
            dims,
            scale: self.scale * other.scale,
            symbol: join_symbol(&self.symbol, "*", &other.symbol),
        }
    }

    /// Quotient of two units.
    pub fn per(&self, other: &Unit) -> Unit {
        self.times(&other.powf(-1.0)).with_symbol(join_symbol(&self.symbol, "/", &other.symbol))
    }

    /// Unit raised to a real power.
    pub fn powf(&self, exponent: f64) -> Unit {
        let mut dims = self.dims;
        for d in dims.iter_mut() {
            *d *= exponent;
        }
        Unit {
            dims,
            scale: self.scale.powf(exponent),
            symbol: if exponent == 1.0 {
                self.symbol.clone()
            } else {
                format!("{}^{}", self.symbol, exponent)
            },
        }
    }

    fn with_symbol(mut self, symbol: String) -> Unit {
        self.symbol = symbol;
        self
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::dimensionless()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl FromStr for Unit {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Unit> {
        UnitTable::standard().parse(s)
    }
}

/// Length of the leading floating-point literal in `text`.
fn number_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let c = bytes[end];
        let sign_ok = (c == b'-' || c == b'+')
            && (end == 0 || matches!(bytes[end - 1], b'e' | b'E'));
        let exp_ok = (c == b'e' || c == b'E')
            && end > 0
            && bytes
                .get(end + 1)
                .is_some_and(|n| n.is_ascii_digit() || *n == b'-' || *n == b'+');
        if c.is_ascii_digit() || c == b'.' || sign_ok || exp_ok {
            end += 1;
        } else {
            break;
        }
    }
    end
}

fn join_symbol(a: &str, op: &str, b: &str) -> String {
    match (a, b) {
        ("-", _) if op == "*" => b.to_string(),
        (_, "-") => a.to_string(),
        _ => format!("{a}{op}{b}"),
    }
}

/// A magnitude together with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Quantity { value, unit }
    }

    /// Parse `"<number>"` or `"<number><unit>"` / `"<number> <unit>"`.
    pub fn parse(text: &str, table: &UnitTable) -> Result<Quantity> {
        let text = text.trim();
        let (number, unit) = text.split_at(number_prefix_len(text));
        let value: f64 = number
            .parse()
            .map_err(|_| SizingError::UnknownUnit(format!("cannot read a number from '{text}'")))?;
        let unit = unit.trim();
        let unit = if unit.is_empty() {
            Unit::dimensionless()
        } else {
            table.parse(unit)?
        };
        Ok(Quantity { value, unit })
    }

    /// Express this quantity in `target`.
    pub fn to(&self, target: &Unit) -> Option<f64> {
        self.unit.conversion_to(target).map(|k| k * self.value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() && self.unit.symbol() == "-" {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} [{}]", self.value, self.unit)
        }
    }
}

/// Symbol table used to parse unit strings.
#[derive(Debug, Clone)]
pub struct UnitTable {
    symbols: HashMap<&'static str, Unit>,
}

impl UnitTable {
    /// Empty table.
    pub fn empty() -> Self {
        UnitTable {
            symbols: HashMap::new(),
        }
    }

    /// Table with SI and the imperial/aviation units the sizing models use.
    pub fn si() -> Self {
        const M: [f64; NDIM] = [1.0, 0.0, 0.0, 0.0, 0.0];
        const L: [f64; NDIM] = [0.0, 1.0, 0.0, 0.0, 0.0];
        const T: [f64; NDIM] = [0.0, 0.0, 1.0, 0.0, 0.0];
        const K: [f64; NDIM] = [0.0, 0.0, 0.0, 1.0, 0.0];
        const A: [f64; NDIM] = [0.0, 0.0, 0.0, 0.0, 1.0];
        const FORCE: [f64; NDIM] = [1.0, 1.0, -2.0, 0.0, 0.0];
        const ENERGY: [f64; NDIM] = [1.0, 2.0, -2.0, 0.0, 0.0];
        const POWER: [f64; NDIM] = [1.0, 2.0, -3.0, 0.0, 0.0];
        const PRESSURE: [f64; NDIM] = [1.0, -1.0, -2.0, 0.0, 0.0];
        const SPEED: [f64; NDIM] = [0.0, 1.0, -1.0, 0.0, 0.0];
        const FREQ: [f64; NDIM] = [0.0, 0.0, -1.0, 0.0, 0.0];
        const NONE: [f64; NDIM] = [0.0; NDIM];

        let lbf_n = KG_PER_LBF * G0;
        let mut table = UnitTable::empty();
        let entries: &[(&'static str, [f64; NDIM], f64)] = &[
            ("-", NONE, 1.0),
            ("kg", M, 1.0),
            ("g", M, 1e-3),
            ("lb", M, KG_PER_LBF),
            ("m", L, 1.0),
            ("cm", L, 1e-2),
            ("mm", L, 1e-3),
            ("km", L, 1e3),
            ("ft", L, 0.3048),
            ("in", L, 0.0254),
            ("nmi", L, 1852.0),
            ("s", T, 1.0),
            ("min", T, 60.0),
            ("hr", T, 3600.0),
            ("h", T, 3600.0),
            ("K", K, 1.0),
            ("A", A, 1.0),
            ("N", FORCE, 1.0),
            ("lbf", FORCE, lbf_n),
            ("J", ENERGY, 1.0),
            ("Wh", ENERGY, 3600.0),
            ("kWh", ENERGY, 3.6e6),
            ("W", POWER, 1.0),
            ("kW", POWER, 1e3),
            ("hp", POWER, 745.699_872),
            ("Pa", PRESSURE, 1.0),
            ("kPa", PRESSURE, 1e3),
            ("psi", PRESSURE, lbf_n / (0.0254 * 0.0254)),
            ("knot", SPEED, 1852.0 / 3600.0),
            ("kts", SPEED, 1852.0 / 3600.0),
            ("Hz", FREQ, 1.0),
            ("rpm", FREQ, 1.0 / 60.0),
        ];
        for (symbol, dims, scale) in entries {
            table.insert(symbol, Unit::base(symbol, *dims, *scale));
        }
        table
    }

    /// Shared instance of [`UnitTable::si`].
    pub fn standard() -> &'static UnitTable {
        static TABLE: OnceLock<UnitTable> = OnceLock::new();
        TABLE.get_or_init(UnitTable::si)
    }

    /// Register a symbol.
    pub fn insert(&mut self, symbol: &'static str, unit: Unit) {
        self.symbols.insert(symbol, unit);
    }

    /// Look up a single symbol.
    pub fn get(&self, symbol: &str) -> Option<&Unit> {
        self.symbols.get(symbol)
    }

    /// Parse a compound unit such as `W/kg`, `N*m/kg`, `kg**0.201` or `1/hr`.
    pub fn parse(&self, text: &str) -> Result<Unit> {
        let text = text.trim();
        if text.is_empty() || text == "-" {
            return Ok(Unit::dimensionless());
        }

        let mut unit = Unit::dimensionless();
        let mut dividing = false;
        let mut rest = text;
        loop {
            let end = rest.find(['*', '/']).unwrap_or(rest.len());
            // `**` is the power operator, not a product.
            let end = match rest[end..].starts_with("**") {
                true => {
                    let after = &rest[end + 2..];
                    end + 2 + after.find(['*', '/']).unwrap_or(after.len())
                }
                false => end,
            };
            let factor = self.parse_factor(&rest[..end], text)?;
            unit = if dividing {
                unit.times(&factor.powf(-1.0))
            } else {
                unit.times(&factor)
            };
            if end == rest.len() {
                break;
            }
            dividing = rest[end..].starts_with('/');
            rest = &rest[end + 1..];
        }
        Ok(unit.with_symbol(text.to_string()))
    }

    fn parse_factor(&self, factor: &str, whole: &str) -> Result<Unit> {
        let factor = factor.trim();
        let (symbol, exponent) = match factor.split_once("**").or_else(|| factor.split_once('^')) {
            Some((s, e)) => {
                let e: f64 = e
                    .trim()
                    .parse()
                    .map_err(|_| SizingError::UnknownUnit(whole.to_string()))?;
                (s.trim(), e)
            }
            None => (factor, 1.0),
        };
        if symbol == "1" {
            return Ok(Unit::dimensionless());
        }
        let base = self
            .get(symbol)
            .ok_or_else(|| SizingError::UnknownUnit(whole.to_string()))?;
        Ok(base.powf(exponent))
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        UnitTable::si()
    }
}
