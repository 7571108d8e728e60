//! Guard registry.
//!
//! Guards are stored in registration order; the write evaluator depends on
//! that order for short-circuiting and reason concatenation. Names are not
//! required to be unique; removal deletes the first match.

use super::Guard;

/// Ordered collection of guards.
#[derive(Debug, Clone, Default)]
pub struct GuardRegistry {
    guards: Vec<Guard>,
}

impl GuardRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a guard.
    pub fn add(&mut self, guard: Guard) {
        self.guards.push(guard);
    }

    /// Removes the first guard with the given name.
    ///
    /// Returns true if a guard was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.guards.iter().position(|g| g.name == name) {
            Some(index) => {
                self.guards.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns true if any guard has the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.guards.iter().any(|g| g.name == name)
    }

    /// All registered guards, in registration order.
    #[must_use]
    pub fn list(&self) -> &[Guard] {
        &self.guards
    }

    /// Number of registered guards, disabled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Returns true if no guards are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Enabled guards whose pattern matches the given key, in order.
    #[must_use]
    pub fn for_key(&self, key: &str) -> Vec<&Guard> {
        self.guards
            .iter()
            .filter(|g| g.enabled && g.applies_to(key))
            .collect()
    }

    /// Mutable access to the first guard with the given name.
    ///
    /// Used by adapters to toggle `enabled`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Guard> {
        self.guards.iter_mut().find(|g| g.name == name)
    }
}
