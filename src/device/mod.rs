//! Audio endpoint service: the platform boundary
//!
//! The compiler and dispatcher never talk to an audio API directly. They go
//! through [`DeviceService`], which has an in-memory implementation for tests
//! and simulation and a Core Audio implementation on Windows.

pub mod memory;
#[cfg(windows)]
pub mod windows;

pub use memory::InMemoryDevices;
#[cfg(windows)]
pub use self::windows::WasapiDevices;

use crate::core::error::DispatchError;
use crate::core::types::{Direction, Role};

/// Enumerate endpoints, read their names, and make one the default
pub trait DeviceService {
    type Device;

    /// Active devices of one direction, in platform order.
    ///
    /// Fails rather than returning a partial list.
    fn enumerate(&self, direction: Direction) -> Result<Vec<Self::Device>, DispatchError>;

    /// Active devices of every direction
    fn enumerate_all(&self) -> Result<Vec<Self::Device>, DispatchError> {
        let mut devices = Vec::new();
        for direction in Direction::ALL {
            devices.extend(self.enumerate(direction)?);
        }
        Ok(devices)
    }

    /// Human-readable display name
    fn name_of(&self, device: &Self::Device) -> Result<String, DispatchError>;

    fn set_default(&self, device: &Self::Device, role: Role) -> Result<(), DispatchError>;
}

/// Device names for `direction`, or for every direction when `None`
pub fn list_names<S: DeviceService>(
    service: &S,
    direction: Option<Direction>,
) -> Result<Vec<String>, DispatchError> {
    let devices = match direction {
        Some(direction) => service.enumerate(direction)?,
        None => service.enumerate_all()?,
    };

    devices
        .iter()
        .map(|device| service.name_of(device))
        .collect()
}
