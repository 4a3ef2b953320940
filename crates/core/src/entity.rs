//! Entity trait: identity + continuity across state changes.

/// Something persisted by id and loaded back through a [`crate::Repository`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable entity name, used in not-found reports (`Author(<id>)`).
    const NAME: &'static str;

    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
