//! Primitive-array bulk-copy fast path.

use crate::config::{MemberMap, ProfileMap, TypeMapRegistry, TypePair};
use crate::error::MapError;
use crate::expr::{factory, Expr, Param};
use crate::ty::{MethodDef, Ty};

use super::{ArrayMapper, ObjectMapper};

/// Maps primitive arrays with one bulk copy instead of a per-element loop.
///
/// Claims only pairs where both sides are arrays of the same primitive
/// element type; everything else falls through to [`ArrayMapper`]. Even a
/// claimed pair defers to the general mapper when a per-element conversion
/// is registered for the element type, since a bulk copy would skip it.
pub struct ArrayCopyMapper;

impl ObjectMapper for ArrayCopyMapper {
    fn is_match(&self, pair: &TypePair) -> bool {
        match (pair.source.array_elem(), pair.dest.array_elem()) {
            (Some(source_elem), Some(dest_elem)) => {
                source_elem == dest_elem && source_elem.is_primitive()
            }
            _ => false,
        }
    }

    fn map_expression(
        &self,
        registry: &dyn TypeMapRegistry,
        profile: &ProfileMap,
        member_map: Option<&MemberMap>,
        source: &Expr,
        dest: &Expr,
        context: &Expr,
    ) -> Result<Expr, MapError> {
        let source_ty = source.ty();
        let dest_ty = dest.ty();
        let source_elem = crate::element::element_type(&source_ty)?;
        let dest_elem = crate::element::element_type(&dest_ty)?;

        if registry.find_type_map_for(&source_elem, &dest_elem).is_some() {
            return ArrayMapper.map_expression(registry, profile, member_map, source, dest, context);
        }

        let value_if_null = if profile.allows_null_collections_for(member_map) {
            factory::null_of(&dest_ty)
        } else {
            factory::new_array(&dest_elem, &factory::i64_const(0))
        };

        let dest_var = Param::new("dest_array", dest_ty);
        let source_length = Param::new("source_length", Ty::i64());
        let map_expr = factory::block(
            vec![dest_var.clone(), source_length.clone()],
            vec![
                factory::assign(&source_length.expr(), &factory::array_length(source)),
                factory::assign(
                    &dest_var.expr(),
                    &factory::new_array(&dest_elem, &source_length.expr()),
                ),
                factory::call(
                    MethodDef::array_copy(),
                    None,
                    vec![source.clone(), dest_var.expr(), source_length.expr()],
                ),
                dest_var.expr(),
            ],
        );

        Ok(factory::cond(
            &factory::equal(source, &factory::null_of(&source.ty())),
            &value_if_null,
            &map_expr,
        ))
    }
}
