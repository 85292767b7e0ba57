//! Type-erased component columns.
//!
//! A table stores one [`Column`] per type key. The concrete column is always a
//! [`TypedColumn<T>`]; the trait object lets tables move and drop rows without
//! knowing `T`.

use std::any::Any;

use tessera_foundation::Value;

use crate::component::Component;

/// Dense array of one component type, addressed by row.
pub trait Column: Any {
    /// Number of rows stored.
    fn len(&self) -> usize;

    /// Returns true if no rows are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes `row`, moving the last row into its place.
    fn swap_remove(&mut self, row: usize);

    /// Swap-removes `row` and pushes its value onto `destination`.
    ///
    /// # Panics
    ///
    /// Panics if `destination` stores a different component type. Tables only
    /// pair columns created for the same type key, so this cannot happen
    /// through the store's own transitions.
    fn move_row(&mut self, row: usize, destination: &mut dyn Column);

    /// Pushes a boxed value, handing it back if it has the wrong type.
    ///
    /// # Errors
    ///
    /// Returns the original box when it does not hold this column's type.
    fn push_any(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;

    /// Describes the value at `row`.
    fn snapshot(&self, row: usize) -> Value;

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Column storing values of `T`.
#[derive(Debug)]
pub struct TypedColumn<T> {
    values: Vec<T>,
}

impl<T: Component> TypedColumn<T> {
    /// Creates an empty column with reserved space.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends a value.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Returns the value at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    /// Returns the value at `row` mutably.
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.values.get_mut(row)
    }

    /// Returns all values in row order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Returns all values in row order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl<T: Component> Column for TypedColumn<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn swap_remove(&mut self, row: usize) {
        self.values.swap_remove(row);
    }

    fn move_row(&mut self, row: usize, destination: &mut dyn Column) {
        let Some(destination) = destination.as_any_mut().downcast_mut::<Self>() else {
            unreachable!(
                "column of {} paired with a foreign column",
                std::any::type_name::<T>()
            );
        };
        destination.values.push(self.values.swap_remove(row));
    }

    fn push_any(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let value = value.downcast::<T>()?;
        self.values.push(*value);
        Ok(())
    }

    fn snapshot(&self, row: usize) -> Value {
        self.values.get(row).map_or(Value::Nil, Component::to_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Builds an empty boxed column for `T`.
pub(crate) fn new_column<T: Component>(capacity: usize) -> Box<dyn Column> {
    Box::new(TypedColumn::<T>::with_capacity(capacity))
}
