//! Tessera - Archetype-based entity/component store
//!
//! This crate re-exports all layers of the Tessera system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: tessera_storage     - Tables, archetype graph, queries, deferral
//! Layer 0: tessera_foundation  - Core types (Identity, TypeKey, Value, Error)
//! ```

pub use tessera_foundation as foundation;
pub use tessera_storage as storage;
