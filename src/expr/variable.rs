//! Variable identity and creation with builder pattern.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::error::{Result, SizingError};
use crate::units::{Unit, UnitTable};

/// Unique identifier for variables and variable arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

impl VarId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        VarId(NEXT_ID.fetch_add(1, AtomicOrdering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for VarId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a variable was declared as.
///
/// A variable is exactly one of free, fixed or swept.
#[derive(Debug, Clone, PartialEq)]
pub enum Declared {
    /// Decision variable.
    Free,
    /// Constant with a value in the variable's unit.
    Fixed(f64),
    /// Constant taking each listed value in turn.
    Sweep(Vec<f64>),
}

/// Position of an element inside a [`VarArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayPosition {
    pub array: VarId,
    pub index: usize,
    pub len: usize,
}

/// Immutable data behind a [`VarKey`].
#[derive(Debug)]
pub struct VariableData {
    /// Unique identifier.
    pub id: VarId,
    /// Short name within the owning model.
    pub name: String,
    /// Name of the owning model.
    pub owner: String,
    /// Declared unit.
    pub unit: Unit,
    /// Optional description for reports.
    pub description: Option<String>,
    /// Declared assignment.
    pub declared: Declared,
    /// Starting guess for the first linearization.
    pub nominal: Option<f64>,
    /// Set when this variable is one station of a vector variable.
    pub array: Option<ArrayPosition>,
}

/// Shared handle to a variable. Equality, hashing and ordering use the id.
#[derive(Clone)]
pub struct VarKey(Arc<VariableData>);

impl VarKey {
    pub fn id(&self) -> VarId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn owner(&self) -> &str {
        &self.0.owner
    }

    pub fn unit(&self) -> &Unit {
        &self.0.unit
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    pub fn declared(&self) -> &Declared {
        &self.0.declared
    }

    pub fn nominal(&self) -> Option<f64> {
        self.0.nominal
    }

    pub fn array(&self) -> Option<ArrayPosition> {
        self.0.array
    }

    /// Name with the station index for vector elements, e.g. `t[2]`.
    pub fn display_name(&self) -> String {
        match self.0.array {
            Some(pos) => format!("{}[{}]", self.0.name, pos.index),
            None => self.0.name.clone(),
        }
    }
}

impl PartialEq for VarKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for VarKey {}

impl Hash for VarKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for VarKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VarKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Debug for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.owner.is_empty() {
            write!(f, "{}", self.display_name())
        } else {
            write!(f, "{}.{}", self.0.owner, self.display_name())
        }
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// A fixed-size per-station vector of variables owned by one model.
#[derive(Debug, Clone)]
pub struct VarArray {
    id: VarId,
    name: String,
    owner: String,
    unit: Unit,
    elements: Vec<VarKey>,
}

impl VarArray {
    pub fn id(&self) -> VarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VarKey> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[VarKey] {
        &self.elements
    }
}

impl Index<usize> for VarArray {
    type Output = VarKey;

    fn index(&self, index: usize) -> &VarKey {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a VarArray {
    type Item = &'a VarKey;
    type IntoIter = std::slice::Iter<'a, VarKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Builder for creating variables with various attributes.
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    name: String,
    owner: String,
    unit: String,
    description: Option<String>,
    declared: Declared,
    station_values: Option<Vec<f64>>,
    nominal: Option<f64>,
}

impl VariableBuilder {
    /// Create a new free, dimensionless variable builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            unit: "-".into(),
            description: None,
            declared: Declared::Free,
            station_values: None,
            nominal: None,
        }
    }

    /// Set the unit string, parsed when the variable is built.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set a description for reports.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Make the variable a constant with this value.
    pub fn value(mut self, value: f64) -> Self {
        self.declared = Declared::Fixed(value);
        self.station_values = None; // Can't be both
        self
    }

    /// Make each station of a vector variable a constant.
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.station_values = Some(values);
        self.declared = Declared::Free;
        self
    }

    /// Mark the variable as swept over these values.
    pub fn sweep(mut self, values: Vec<f64>) -> Self {
        self.declared = Declared::Sweep(values);
        self.station_values = None; // Can't be both
        self
    }

    /// Starting guess for the first linearization.
    pub fn nominal(mut self, value: f64) -> Self {
        self.nominal = Some(value);
        self
    }

    /// Set the owning model name.
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Build a scalar variable using the standard unit table.
    pub fn build(self) -> Result<VarKey> {
        self.build_with(UnitTable::standard())
    }

    /// Build a scalar variable using the given unit table.
    pub fn build_with(self, table: &UnitTable) -> Result<VarKey> {
        if self.station_values.is_some() {
            return Err(SizingError::InvalidModel(format!(
                "per-station values given for scalar variable {}",
                self.name
            )));
        }
        let unit = table.parse(&self.unit)?;
        check_declared(&self.name, &self.declared)?;
        Ok(VarKey(Arc::new(VariableData {
            id: VarId::new(),
            name: self.name,
            owner: self.owner,
            unit,
            description: self.description,
            declared: self.declared,
            nominal: self.nominal,
            array: None,
        })))
    }

    /// Build a vector variable with `len` stations.
    pub fn build_array(self, len: usize, table: &UnitTable) -> Result<VarArray> {
        if len == 0 {
            return Err(SizingError::InvalidModel(format!(
                "vector variable {} needs at least one station",
                self.name
            )));
        }
        if let Some(values) = &self.station_values {
            if values.len() != len {
                return Err(SizingError::InvalidModel(format!(
                    "vector variable {} has {} stations but {} values",
                    self.name,
                    len,
                    values.len()
                )));
            }
        }
        let unit = table.parse(&self.unit)?;
        check_declared(&self.name, &self.declared)?;

        let array_id = VarId::new();
        let elements = (0..len)
            .map(|index| {
                let declared = match &self.station_values {
                    Some(values) => Declared::Fixed(values[index]),
                    None => self.declared.clone(),
                };
                check_declared(&self.name, &declared)?;
                Ok(VarKey(Arc::new(VariableData {
                    id: VarId::new(),
                    name: self.name.clone(),
                    owner: self.owner.clone(),
                    unit: unit.clone(),
                    description: self.description.clone(),
                    declared,
                    nominal: self.nominal,
                    array: Some(ArrayPosition {
                        array: array_id,
                        index,
                        len,
                    }),
                })))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VarArray {
            id: array_id,
            name: self.name,
            owner: self.owner,
            unit,
            elements,
        })
    }
}

fn check_declared(name: &str, declared: &Declared) -> Result<()> {
    let positive = |v: &f64| v.is_finite() && *v > 0.0;
    match declared {
        Declared::Free => Ok(()),
        Declared::Fixed(v) if positive(v) => Ok(()),
        Declared::Sweep(values) if !values.is_empty() && values.iter().all(positive) => Ok(()),
        Declared::Fixed(v) => Err(SizingError::invalid_substitution(
            name,
            format!("value {v} is not strictly positive"),
        )),
        Declared::Sweep(_) => Err(SizingError::invalid_substitution(
            name,
            "sweep values must be a non-empty list of positive numbers",
        )),
    }
}

/// Create a free variable builder with a unit.
///
/// ```
/// use gpsize::expr::var;
///
/// let mass = var("m", "kg").describe("aircraft mass").build().unwrap();
/// assert_eq!(mass.unit().symbol(), "kg");
/// ```
pub fn var(name: impl Into<String>, unit: impl Into<String>) -> VariableBuilder {
    VariableBuilder::new(name).unit(unit)
}
