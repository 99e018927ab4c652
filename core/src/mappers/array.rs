//! General array-to-array mapping strategy.

use crate::config::{MemberMap, ProfileMap, TypeMapRegistry, TypePair};
use crate::error::MapError;
use crate::expr::rewrite::convert_replace_parameters;
use crate::expr::{factory, loops, Expr, Param};
use crate::ty::Ty;

use super::ObjectMapper;

/// Maps any array to an array, converting element by element.
///
/// Each element goes through the registered conversion for the element
/// pair when one exists, and through a plain widening otherwise. The
/// emitted loop indexes the destination with its own counter so the shape
/// also serves sources iterated by enumerator.
pub struct ArrayMapper;

impl ObjectMapper for ArrayMapper {
    fn is_match(&self, pair: &TypePair) -> bool {
        pair.source.is_array() && pair.dest.is_array()
    }

    fn map_expression(
        &self,
        registry: &dyn TypeMapRegistry,
        profile: &ProfileMap,
        member_map: Option<&MemberMap>,
        source: &Expr,
        dest: &Expr,
        _context: &Expr,
    ) -> Result<Expr, MapError> {
        let source_ty = source.ty();
        let dest_ty = dest.ty();
        let source_elem = crate::element::element_type(&source_ty)?;
        let dest_elem = crate::element::element_type(&dest_ty)?;

        let value_if_null = if profile.allows_null_collections_for(member_map) {
            factory::null_of(&dest_ty)
        } else {
            factory::new_array(&dest_elem, &factory::i64_const(0))
        };

        let item = Param::new("item", source_elem.clone());
        let mapped_item = match registry.find_type_map_for(&source_elem, &dest_elem) {
            Some(type_map) => match &type_map.conversion {
                Some(conversion) => factory::to_type(
                    &convert_replace_parameters(conversion, &[item.expr()]),
                    &dest_elem,
                ),
                None => factory::to_type(&item.expr(), &dest_elem),
            },
            None => factory::to_type(&item.expr(), &dest_elem),
        };

        let dest_var = Param::new("dest_array", dest_ty);
        let index = Param::new("dest_index", Ty::i64());
        let fill = loops::for_each(
            source,
            &item,
            &factory::block(
                vec![],
                vec![
                    factory::assign(
                        &factory::array_index(&dest_var.expr(), &index.expr()),
                        &mapped_item,
                    ),
                    factory::assign(
                        &index.expr(),
                        &factory::add(&index.expr(), &factory::i64_const(1)),
                    ),
                ],
            ),
        );
        let map_expr = factory::block(
            vec![dest_var.clone(), index.clone()],
            vec![
                factory::assign(&index.expr(), &factory::i64_const(0)),
                factory::assign(
                    &dest_var.expr(),
                    &factory::new_array(&dest_elem, &factory::array_length(source)),
                ),
                fill,
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
