//! Mapping configuration: type pairs, policy, and the strategy catalog.
//!
//! The catalog owns the ordered strategy list and the registered per-pair
//! type maps, emits mapping lambdas on demand, and caches the compiled
//! form so repeated requests for a pair share one plan.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use tracing::debug;

use crate::error::{ExecError, MapError};
use crate::eval::Evaluator;
use crate::expr::{factory, Expr, Param};
use crate::mappers::{ArrayCopyMapper, ArrayMapper, ObjectMapper};
use crate::ty::Ty;
use crate::values::Value;

/// A source/destination type pairing, the unit of strategy selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: Ty,
    pub dest: Ty,
}

impl TypePair {
    pub fn new(source: Ty, dest: Ty) -> Self {
        Self { source, dest }
    }
}

/// Profile-wide mapping policy.
#[derive(Clone, Debug, Default)]
pub struct ProfileMap {
    /// Whether a null source collection maps to a null destination instead
    /// of an empty one.
    pub allow_null_collections: bool,
}

impl ProfileMap {
    /// The effective null-collections policy for a member, with the
    /// member-level override taking precedence over the profile.
    pub fn allows_null_collections_for(&self, member_map: Option<&MemberMap>) -> bool {
        member_map
            .and_then(|m| m.allow_null_collections)
            .unwrap_or(self.allow_null_collections)
    }
}

/// Per-member configuration consulted when a pair is mapped as a member of
/// an enclosing map.
#[derive(Clone, Debug, Default)]
pub struct MemberMap {
    pub destination: String,
    pub allow_null_collections: Option<bool>,
}

/// A registered conversion for one type pair.
///
/// The conversion, when present, is a single-parameter lambda from the
/// source type to the destination type; element mappers inline it per
/// element.
#[derive(Clone, Debug)]
pub struct TypeMap {
    pub pair: TypePair,
    pub conversion: Option<Expr>,
}

impl TypeMap {
    pub fn new(pair: TypePair, conversion: Option<Expr>) -> Self {
        Self { pair, conversion }
    }
}

/// Lookup seam between strategies and the configuration that owns them.
pub trait TypeMapRegistry {
    fn find_type_map_for(&self, source: &Ty, dest: &Ty) -> Option<&TypeMap>;
}

/// The strategy catalog and type-map store.
pub struct MapCatalog {
    profile: ProfileMap,
    type_maps: HashMap<TypePair, TypeMap>,
    mappers: Vec<Box<dyn ObjectMapper>>,
    compiled: RefCell<HashMap<TypePair, Rc<CompiledMap>>>,
}

impl MapCatalog {
    /// A catalog with the built-in strategies in precedence order: the
    /// primitive-array fast path ahead of the general array mapper.
    pub fn new(profile: ProfileMap) -> Self {
        Self {
            profile,
            type_maps: HashMap::new(),
            mappers: vec![Box::new(ArrayCopyMapper), Box::new(ArrayMapper)],
            compiled: RefCell::new(HashMap::new()),
        }
    }

    pub fn profile(&self) -> &ProfileMap {
        &self.profile
    }

    pub fn register_type_map(&mut self, type_map: TypeMap) {
        self.compiled.borrow_mut().remove(&type_map.pair);
        self.type_maps.insert(type_map.pair.clone(), type_map);
    }

    /// The first strategy accepting the pair, in registration order.
    pub fn find_mapper(&self, pair: &TypePair) -> Option<&dyn ObjectMapper> {
        let found = self.mappers.iter().find(|m| m.is_match(pair));
        debug!(
            source = %pair.source,
            dest = %pair.dest,
            matched = found.is_some(),
            "strategy lookup"
        );
        found.map(|m| &**m)
    }

    /// Emits the mapping lambda `|source, context| ...` for a pair.
    pub fn map_expression(
        &self,
        pair: &TypePair,
        member_map: Option<&MemberMap>,
    ) -> Result<Expr, MapError> {
        let mapper = self
            .find_mapper(pair)
            .ok_or_else(|| MapError::MissingStrategy {
                source: pair.source.clone(),
                dest: pair.dest.clone(),
            })?;
        let source = Param::new("source", pair.source.clone());
        let context = Param::new("context", Ty::any());
        let body = mapper.map_expression(
            self,
            &self.profile,
            member_map,
            &source.expr(),
            &factory::default_of(&pair.dest),
            &context.expr(),
        )?;
        Ok(factory::lambda(vec![source, context], body))
    }

    /// The compiled plan for a pair, emitted once and cached.
    pub fn compile(&self, pair: &TypePair) -> Result<Rc<CompiledMap>, MapError> {
        if let Some(plan) = self.compiled.borrow().get(pair) {
            return Ok(plan.clone());
        }
        let lambda = self.map_expression(pair, None)?;
        debug!(source = %pair.source, dest = %pair.dest, "compiled mapping plan");
        let plan = Rc::new(CompiledMap {
            pair: pair.clone(),
            lambda,
        });
        self.compiled
            .borrow_mut()
            .insert(pair.clone(), plan.clone());
        Ok(plan)
    }
}

impl TypeMapRegistry for MapCatalog {
    fn find_type_map_for(&self, source: &Ty, dest: &Ty) -> Option<&TypeMap> {
        self.type_maps
            .get(&TypePair::new(source.clone(), dest.clone()))
    }
}

/// An emitted mapping plan, executable against runtime values.
#[derive(Debug)]
pub struct CompiledMap {
    pair: TypePair,
    lambda: Expr,
}

impl CompiledMap {
    pub fn pair(&self) -> &TypePair {
        &self.pair
    }

    /// The underlying mapping lambda, for inspection.
    pub fn expression(&self) -> &Expr {
        &self.lambda
    }

    /// Runs the plan over a source value.
    pub fn execute(&self, source: Value) -> Result<Value, ExecError> {
        Evaluator::run_lambda(&self.lambda, &[source, Value::Null])
    }
}
