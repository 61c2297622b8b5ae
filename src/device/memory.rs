//! In-memory device service
//!
//! Holds an ordered device list per direction and records every call made
//! against it. Failures can be injected per direction or per device name.

use crate::core::config::SimulatedDevice;
use crate::core::error::DispatchError;
use crate::core::types::{Direction, Role};
use crate::device::DeviceService;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDevice {
    pub id: String,
    pub direction: Direction,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct InMemoryDevices {
    devices: Vec<MemoryDevice>,
    failing_enumeration: HashSet<Direction>,
    failing_names: HashSet<String>,
    failing_set_default: HashSet<(String, Option<Role>)>,
    enumerate_calls: RefCell<Vec<Direction>>,
    set_default_calls: RefCell<Vec<(String, Role)>>,
    defaults: RefCell<HashMap<(Direction, Role), String>>,
}

impl InMemoryDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `simulate` section of the config
    pub fn from_simulated(devices: &[SimulatedDevice]) -> Self {
        devices
            .iter()
            .fold(Self::new(), |service, device| {
                service.with_device(device.direction, device.name.clone())
            })
    }

    /// Append a device to the end of its direction's enumeration order
    pub fn with_device(mut self, direction: Direction, name: impl Into<String>) -> Self {
        let id = format!("{{sim.{}.{}}}", direction, self.devices.len());
        self.devices.push(MemoryDevice {
            id,
            direction,
            name: name.into(),
        });
        self
    }

    pub fn fail_enumeration(mut self, direction: Direction) -> Self {
        self.failing_enumeration.insert(direction);
        self
    }

    /// Reading the name of any device called `name` fails
    pub fn fail_name_lookup(mut self, name: impl Into<String>) -> Self {
        self.failing_names.insert(name.into());
        self
    }

    /// Making any device called `name` the default fails, for every role
    pub fn fail_set_default(mut self, name: impl Into<String>) -> Self {
        self.failing_set_default.insert((name.into(), None));
        self
    }

    /// Making any device called `name` the default fails for `role` only
    pub fn fail_set_default_role(mut self, name: impl Into<String>, role: Role) -> Self {
        self.failing_set_default.insert((name.into(), Some(role)));
        self
    }

    pub fn enumerate_calls(&self) -> Vec<Direction> {
        self.enumerate_calls.borrow().clone()
    }

    /// Successful set-default calls as (device name, role), in call order
    pub fn set_default_calls(&self) -> Vec<(String, Role)> {
        self.set_default_calls.borrow().clone()
    }

    /// Name of the device currently holding a default slot
    pub fn default_for(&self, direction: Direction, role: Role) -> Option<String> {
        self.defaults.borrow().get(&(direction, role)).cloned()
    }
}

impl DeviceService for InMemoryDevices {
    type Device = MemoryDevice;

    fn enumerate(&self, direction: Direction) -> Result<Vec<MemoryDevice>, DispatchError> {
        self.enumerate_calls.borrow_mut().push(direction);

        if self.failing_enumeration.contains(&direction) {
            return Err(DispatchError::enumeration(direction, "simulated failure"));
        }

        Ok(self
            .devices
            .iter()
            .filter(|d| d.direction == direction)
            .cloned()
            .collect())
    }

    fn name_of(&self, device: &MemoryDevice) -> Result<String, DispatchError> {
        if self.failing_names.contains(&device.name) {
            return Err(DispatchError::NameLookupFailed {
                reason: format!("simulated failure for {}", device.id),
            });
        }
        Ok(device.name.clone())
    }

    fn set_default(&self, device: &MemoryDevice, role: Role) -> Result<(), DispatchError> {
        let failing = &self.failing_set_default;
        let name = device.name.clone();
        if failing.contains(&(name.clone(), None)) || failing.contains(&(name, Some(role))) {
            return Err(DispatchError::SetDefaultFailed {
                device: device.name.clone(),
                role,
                reason: "simulated failure".into(),
            });
        }

        self.set_default_calls
            .borrow_mut()
            .push((device.name.clone(), role));
        self.defaults
            .borrow_mut()
            .insert((device.direction, role), device.name.clone());
        Ok(())
    }
}
