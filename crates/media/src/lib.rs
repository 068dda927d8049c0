//! Media domain module.
//!
//! Per-color media binding for catalog products: assets carry an optional
//! color *tag* (not ownership), and the rules here keep tags, grouping, and
//! color-scoped visibility consistent as media is added, removed, or
//! reassigned. Pure deterministic domain logic (no IO, no bytes; the
//! engine only ever sees handles/URLs).

pub mod asset;

pub use asset::{
    MediaAsset, MediaKind, assign_color, filter_for_color, group_by_color, reconcile,
};
