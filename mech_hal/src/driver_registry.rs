//! Driver registry for actuator ports.
//!
//! `ActuatorRegistry` maps driver names to factories. It is built at startup
//! and handed to whoever builds mechanisms; there is no global registry.

use mech_common::actuator::{ActuatorConfig, ActuatorError, ActuatorFactory, ActuatorPort};
use std::collections::HashMap;
use tracing::debug;

use crate::drivers;

/// Registry of available actuator drivers.
pub struct ActuatorRegistry {
    factories: HashMap<&'static str, ActuatorFactory>,
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with every built-in driver.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        drivers::register_builtin(&mut reg);
        reg
    }

    /// Register a driver factory.
    ///
    /// # Errors
    /// `ActuatorError::DuplicateDriver` if the name is taken.
    pub fn register(
        &mut self,
        name: &'static str,
        factory: ActuatorFactory,
    ) -> Result<(), ActuatorError> {
        if self.factories.contains_key(name) {
            return Err(ActuatorError::DuplicateDriver(name.to_string()));
        }
        debug!(driver = name, "Actuator driver registered");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<ActuatorFactory> {
        self.factories.get(name).copied()
    }

    /// Create a port for `config` using the driver it names.
    ///
    /// The port is not configured yet; the owning mechanism calls
    /// `apply_config` when the port is registered.
    ///
    /// # Errors
    /// `ActuatorError::DriverNotFound` if `config.driver` is unknown.
    pub fn create(&self, config: &ActuatorConfig) -> Result<Box<dyn ActuatorPort>, ActuatorError> {
        let factory = self
            .get_factory(&config.driver)
            .ok_or_else(|| ActuatorError::DriverNotFound(config.driver.clone()))?;
        Ok(factory(config))
    }

    /// Registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
