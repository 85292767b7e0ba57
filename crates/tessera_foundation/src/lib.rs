//! Foundation types for the Tessera archetype store.
//!
//! This crate provides the primitive vocabulary shared by every layer:
//! - [`Identity`] / [`Entity`] - generational entity handles
//! - [`ComponentId`] / [`TypeKey`] - packed component identity, including relation targets
//! - [`Value`] - closed snapshot type used for reflection
//! - [`Error`] - error types with rich context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod identity;
mod type_key;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use identity::{Entity, Identity};
pub use type_key::{ComponentId, TypeKey, WildcardKey};
pub use value::Value;
