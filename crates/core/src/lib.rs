//! `souk-core` — shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (identifiers, value objects,
//! the domain error model). No storage, transport or auth concerns live here.

pub mod email;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use email::{Email, EmailError};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BrandId, PrincipalId, ProductId};
pub use value_object::{Price, ValueObject};
