//! Remap - an object-graph transformation engine.
//!
//! # Overview
//!
//! Remap converts one object graph into another by synthesizing an
//! expression tree for each source/destination type pair and executing it
//! over dynamic values. Conversions are described once as configuration;
//! the engine picks a strategy, emits the mapping plan, and caches the
//! compiled form.
//!
//! # Quick Start
//!
//! ```
//! use remap::{MapCatalog, ProfileMap, Ty, TypePair, Value};
//!
//! // A catalog with the built-in strategies and default policy.
//! let catalog = MapCatalog::new(ProfileMap::default());
//!
//! // Compile a plan for copying primitive arrays.
//! let pair = TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
//! let plan = catalog.compile(&pair).unwrap();
//!
//! // Execute it over a runtime value.
//! let source = Value::array(Ty::i32(), vec![Value::i32(1), Value::i32(2)]);
//! let result = plan.execute(source).unwrap();
//! let copy = result.as_array().unwrap();
//! assert_eq!(copy.items(), vec![Value::i32(1), Value::i32(2)]);
//! ```
//!
//! The heavy lifting lives in `remap-core`; this crate re-exports the
//! public surface.

pub use remap_core::config::{
    CompiledMap, MapCatalog, MemberMap, ProfileMap, TypeMap, TypeMapRegistry, TypePair,
};
pub use remap_core::element::{self, ElementTypeFlags};
pub use remap_core::error::{ExecError, MapError};
pub use remap_core::eval::Evaluator;
pub use remap_core::expr::{self, Expr, ExprKind, Param};
pub use remap_core::mappers::{ArrayCopyMapper, ArrayMapper, ObjectMapper};
pub use remap_core::ty::{self, Ty};
pub use remap_core::values::{self, Value};
