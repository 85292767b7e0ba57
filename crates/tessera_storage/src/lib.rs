//! Archetype tables, transition graph, and cached queries for Tessera.
//!
//! This crate provides:
//! - [`World`] - The archetype graph: spawn, despawn, add, remove, query
//! - [`Table`] - Columnar storage for one exact signature
//! - [`Mask`] / [`Query`] - Cached, incrementally maintained table matches
//! - [`ComponentRegistry`] - Explicit catalog of component types
//!
//! The store is single-writer. [`World::lock`] is not thread
//! synchronization: it defers structural changes while a caller iterates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod column;
mod component;
mod config;
mod deferred;
mod entity;
mod index;
mod mask;
mod pool;
mod query;
mod table;
mod world;

pub use column::{Column, TypedColumn};
pub use component::{Component, ComponentInfo, ComponentRegistry, Element};
pub use config::StorageConfig;
pub use entity::{EntityMeta, IdentityAllocator};
pub use mask::Mask;
pub use pool::{MaskPool, Pool, Recycle, ScratchPool};
pub use query::{Query, QueryId};
pub use table::{Table, TableEdge, TableId};
pub use world::{World, WorldInfo};
