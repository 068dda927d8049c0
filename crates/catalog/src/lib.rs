//! Catalog domain module.
//!
//! This crate contains the business rules that keep one product's
//! {stock, variants, colors, sizes} mutually consistent, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod variant;

pub use product::{Product, ProductParts};
pub use variant::{Variant, VariantKey, VariantSet, check_stock_pool};
