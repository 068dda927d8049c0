//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - they have no
/// identity of their own. To "modify" one, create a new one with the new
/// values. `Color` is the canonical example in this workspace: two colors
/// with the same normalized hex are the same color wherever they appear.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
