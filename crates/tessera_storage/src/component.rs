//! Component types and their registry.
//!
//! The registry is owned by a [`World`](crate::World). It assigns every
//! registered Rust type a dense [`ComponentId`] in registration order, with
//! id 0 reserved for [`Entity`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use tessera_foundation::{ComponentId, Entity, Error, Result, TypeKey, Value};

use crate::column::{Column, new_column};

/// Data storable in a table column.
pub trait Component: 'static {
    /// Describes this value for reflection snapshots.
    fn to_value(&self) -> Value {
        Value::Opaque(type_name::<Self>())
    }
}

impl Component for Entity {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

/// Wrapper storing a world element: a singleton kept on the world entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element<T>(pub T);

impl<T: 'static> Component for Element<T> {}

macro_rules! scalar_component {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Component for $ty {
                fn to_value(&self) -> Value {
                    Value::from(self.clone())
                }
            }
        )*
    };
}

scalar_component!(bool, i32, i64, u32, f32, f64, String);

/// Registration record for one component type.
#[derive(Clone)]
pub struct ComponentInfo {
    /// Dense id assigned at registration.
    pub id: ComponentId,
    /// Rust type name, for diagnostics.
    pub name: &'static str,
    /// Rust type identity.
    pub type_id: TypeId,
    /// Builds an empty column for this type with the given capacity.
    pub new_column: fn(usize) -> Box<dyn Column>,
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Catalog mapping Rust types to component ids.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Creates a registry holding only the reserved [`Entity`] component.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            infos: Vec::new(),
            by_type: HashMap::new(),
        };
        registry.insert::<Entity>(ComponentId::ENTITY);
        registry
    }

    /// Registers `T`, returning its id. Registering twice returns the same id.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` once every `u16` id is taken.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        if let Some(id) = self.id_of::<T>() {
            return Ok(id);
        }

        let raw = u16::try_from(self.infos.len())
            .map_err(|_| Error::capacity_exceeded("component types"))?;
        let id = ComponentId::new(raw);
        self.insert::<T>(id);
        Ok(id)
    }

    fn insert<T: Component>(&mut self, id: ComponentId) {
        debug_assert_eq!(id.index(), self.infos.len());
        let type_id = TypeId::of::<T>();
        self.infos.push(ComponentInfo {
            id,
            name: type_name::<T>(),
            type_id,
            new_column: new_column::<T>,
        });
        self.by_type.insert(type_id, id);
    }

    /// Returns the id of `T` if registered.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id of `T`.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` if `T` was never registered.
    pub fn require<T: Component>(&self) -> Result<ComponentId> {
        self.id_of::<T>()
            .ok_or_else(|| Error::unregistered(type_name::<T>()))
    }

    /// Returns the registration record for an id.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Verifies that `key` addresses values of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` if `T` or the key's component id is unknown, and
    /// `TypeMismatch` if the key was registered for another type.
    pub fn check<T: Component>(&self, key: TypeKey) -> Result<()> {
        let actual = type_name::<T>();
        let info = self
            .info(key.component())
            .ok_or_else(|| Error::unregistered(actual))?;
        if info.type_id == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(Error::type_mismatch(key, info.name, actual))
        }
    }

    /// Number of registered types, including [`Entity`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Always false: [`Entity`] is registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterates over all registration records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }
}
