//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared structurally.
///
/// Claims are the main example: two claims with the same issuer and payload are
/// the same fact, no matter which request produced them.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
