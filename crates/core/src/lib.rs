//! `maison-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod color;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use color::Color;
pub use entity::Entity;
pub use error::{ConflictError, DomainError, DomainResult, ValidationError};
pub use id::{AssetId, ProductId};
pub use value_object::ValueObject;
