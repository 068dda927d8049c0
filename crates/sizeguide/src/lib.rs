//! Size guide domain module.
//!
//! Per-size measurement tables for catalog products. Guide sizes and
//! sellable variant sizes are independent namespaces by design; nothing
//! here cross-validates against the variant collection.

pub mod guide;

pub use guide::{SizeGuide, SizeGuideRow};
