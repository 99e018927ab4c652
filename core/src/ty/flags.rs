use bitflags::bitflags;

bitflags! {
    /// Flags indicating various properties of a type descriptor.
    ///
    /// These flags are computed once when a descriptor node is built and
    /// cached for efficient queries. This avoids repeated recursive
    /// traversals of the descriptor tree.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TyFlags: u8 {
        /// Value types are never null; null-propagating rewrites skip them.
        const VALUE_TYPE = 1;
        /// Fixed-width scalars eligible for bulk copying.
        const PRIMITIVE = 1 << 1;
        /// Anything the element-type resolver accepts as a sequence.
        const ENUMERABLE = 1 << 2;
        /// Carries a disposal capability known statically.
        const DISPOSABLE = 1 << 3;
    }
}
