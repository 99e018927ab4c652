//! Expression-synthesis core of the remap object-graph transformation
//! engine.
//!
//! The engine maps a source object graph to a destination graph by
//! emitting an expression tree for each source/destination type pair and
//! executing it over dynamic values. This crate holds the pieces that
//! synthesis is built from:
//!
//! - [`ty`]: immutable runtime type descriptors
//! - [`values`]: the dynamic value model trees execute over
//! - [`expr`]: the expression IR and its toolkit (chains, rewriting,
//!   loops, scoped disposal)
//! - [`element`]: element type resolution for enumerable shapes
//! - [`config`]: type pairs, policy, and the strategy catalog
//! - [`mappers`]: the mapping strategies (bulk copy fast path and the
//!   general array mapper)
//! - [`eval`]: the tree-walking interpreter

pub mod config;
pub mod element;
pub mod error;
pub mod eval;
pub mod expr;
pub mod mappers;
pub mod ty;
pub mod values;

pub use config::{CompiledMap, MapCatalog, MemberMap, ProfileMap, TypeMap, TypeMapRegistry, TypePair};
pub use error::{ExecError, MapError};
pub use eval::Evaluator;
pub use expr::{Expr, ExprKind, Param};
pub use ty::Ty;
pub use values::Value;
