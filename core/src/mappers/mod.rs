//! Mapping strategies.
//!
//! A strategy claims a source/destination type pair and emits the
//! expression tree that performs the conversion. Strategies are consulted
//! in registration order, so specialized fast paths sit in front of the
//! general forms that subsume them.

mod array;
mod array_copy;

#[cfg(test)]
mod array_copy_test;
#[cfg(test)]
mod array_test;

pub use array::ArrayMapper;
pub use array_copy::ArrayCopyMapper;

use crate::config::{MemberMap, ProfileMap, TypeMapRegistry, TypePair};
use crate::error::MapError;
use crate::expr::Expr;

/// One mapping strategy.
pub trait ObjectMapper {
    /// Whether this strategy accepts the pair. Cheap and side-effect free;
    /// the catalog probes every strategy in order.
    fn is_match(&self, pair: &TypePair) -> bool;

    /// Emit the conversion tree for `source` into a value of the pair's
    /// destination type.
    ///
    /// `member_map` carries per-member policy overrides when the pair is
    /// being mapped as a member of an enclosing map; `context` threads the
    /// runtime mapping context parameter through nested emissions.
    fn map_expression(
        &self,
        registry: &dyn TypeMapRegistry,
        profile: &ProfileMap,
        member_map: Option<&MemberMap>,
        source: &Expr,
        dest: &Expr,
        context: &Expr,
    ) -> Result<Expr, MapError>;
}
