//! Hierarchical model composition.
//!
//! Sub-models are built with [`ModelBuilder`], nested as children, and
//! merged into one [`FlattenedSystem`] by [`flatten`].

pub mod flatten;
pub mod node;
pub mod substitution;

pub use flatten::{flatten, FlatConstraint, FlattenedSystem, VarInfo, VarState};
pub use node::{ModelBuilder, ModelNode};
pub use substitution::{Substitution, Substitutions};
