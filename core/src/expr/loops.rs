//! Iteration constructs and scoped disposal.
//!
//! Loops are emitted, not interpreted ad hoc: `for_each` lowers to either
//! an indexed for-loop over arrays or an enumerator walk wrapped in scoped
//! disposal, so one emission path serves every enumerable shape.

use crate::ty::{MethodDef, Ty};

use super::{factory, Expr, FieldRef, Label, Param};

/// Iterates `collection`, binding each element to `loop_var` around `body`.
///
/// Arrays get the indexed fast form. Everything else acquires an
/// enumerator, advances it until exhausted, and disposes it on every exit
/// path; the element is widened to the loop variable's type so a loosely
/// typed source can feed a typed loop.
pub fn for_each(collection: &Expr, loop_var: &Param, body: &Expr) -> Expr {
    if collection.ty().is_array() {
        return for_each_array_item(collection, |item| {
            factory::block(
                vec![loop_var.clone()],
                vec![factory::assign(&loop_var.expr(), &item), body.clone()],
            )
        });
    }
    let elem = collection.ty().iteration_elem();
    let get_enumerator = factory::call(MethodDef::get_enumerator(elem.clone()), Some(collection), vec![]);
    let enumerator = Param::new("enumerator", get_enumerator.ty());
    let move_next = factory::call(MethodDef::move_next(), Some(&enumerator.expr()), vec![]);
    let break_label = Label::new("loop_break");

    let current = factory::field(&enumerator.expr(), FieldRef::read_only("current", elem));
    let iteration = factory::block(
        vec![loop_var.clone()],
        vec![
            factory::assign(&loop_var.expr(), &factory::to_type(&current, &loop_var.ty())),
            body.clone(),
        ],
    );
    let step = factory::cond(
        &factory::equal(&move_next, &factory::bool_const(true)),
        &iteration,
        &factory::break_(break_label.clone()),
    );
    factory::block(
        vec![enumerator.clone()],
        vec![
            factory::assign(&enumerator.expr(), &get_enumerator),
            using_(
                &enumerator.expr(),
                &factory::loop_(&step, break_label),
            ),
        ],
    )
}

/// Indexed iteration over an array, one body per element.
pub fn for_each_array_item(array: &Expr, body: impl FnOnce(Expr) -> Expr) -> Expr {
    let length = factory::array_length(array);
    for_loop(&length, |index| body(factory::array_index(array, &index)))
}

/// A counted loop from zero to `count` (exclusive).
pub fn for_loop(count: &Expr, body: impl FnOnce(Expr) -> Expr) -> Expr {
    let break_label = Label::new("loop_break");
    let index = Param::new("source_index", Ty::i64());
    let step = factory::cond(
        &factory::less_than(&index.expr(), count),
        &factory::block(
            vec![],
            vec![
                body(index.expr()),
                factory::assign(&index.expr(), &factory::add(&index.expr(), &factory::i64_const(1))),
            ],
        ),
        &factory::break_(break_label.clone()),
    );
    factory::block(
        vec![index.clone()],
        vec![
            factory::assign(&index.expr(), &factory::i64_const(0)),
            factory::loop_(&step, break_label),
        ],
    )
}

/// Runs `body` with `resource` disposed afterwards.
///
/// A statically disposable resource gets an unconditional dispose in the
/// finalizer. A value-typed resource needs no disposal and yields the bare
/// body. Otherwise disposal is conditional: the finalizer casts the
/// resource to the disposal capability and disposes only when the cast
/// lands.
pub fn using_(resource: &Expr, body: &Expr) -> Expr {
    let ty = resource.ty();
    let dispose = if ty.is_disposable() {
        factory::call(MethodDef::dispose(), Some(resource), vec![])
    } else {
        if ty.is_value_type() {
            return body.clone();
        }
        let disposable = Param::new("disposable", Ty::disposable());
        factory::block(
            vec![disposable.clone()],
            vec![
                factory::assign(
                    &disposable.expr(),
                    &factory::type_as(resource, &Ty::disposable()),
                ),
                factory::if_null_else(
                    &disposable.expr(),
                    &factory::empty(),
                    Some(&factory::call(
                        MethodDef::dispose(),
                        Some(&disposable.expr()),
                        vec![],
                    )),
                ),
            ],
        )
    };
    factory::try_finally(body, &dispose)
}
