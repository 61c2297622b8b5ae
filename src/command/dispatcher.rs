//! Matching dispatcher - applies compiled commands to live devices
//!
//! Every command is tested against every device, devices in enumeration
//! order and commands in list order. There is no first-match short-circuit
//! and no dedup: each match issues its own set-default calls, so for any
//! one role the last matching device ends up as the default.

use crate::command::compiler::Command;
use crate::core::error::DispatchError;
use crate::core::types::{Direction, Role};
use crate::device::DeviceService;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when a single device fails mid-scan
///
/// Enumeration failure is fatal under both policies. A command with no role
/// that fails on its communications slot keeps the console slot it already
/// set, recorded as a console-only [`Applied`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the remaining scan on the first failure
    #[default]
    FailFast,
    /// Record the failure, skip that device or application, keep scanning
    BestEffort,
}

/// One successful command application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub direction: Direction,
    /// `None` when both roles were set
    pub role: Option<Role>,
    pub device_name: String,
}

impl Applied {
    pub fn new(direction: Direction, role: Option<Role>, device_name: &str) -> Self {
        Self {
            direction,
            role,
            device_name: device_name.to_string(),
        }
    }
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            Some(Role::Console) => "console",
            Some(Role::Communications) => "communications",
            None => "audio",
        };
        write!(
            f,
            "set default {} {} device to: {}",
            role,
            self.direction.noun(),
            self.device_name
        )
    }
}

/// Result of dispatching one direction
///
/// Applications made before a fatal error are kept in `applied`; nothing
/// is rolled back.
#[derive(Debug, Default)]
pub struct DispatchResult {
    pub applied: Vec<Applied>,
    /// Failures passed over under `FailurePolicy::BestEffort`
    pub skipped: Vec<DispatchError>,
    /// The failure that ended the scan
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<Applied>, DispatchError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.applied),
        }
    }
}

pub struct Dispatcher<'a, S: DeviceService> {
    service: &'a S,
    policy: FailurePolicy,
}

impl<'a, S: DeviceService> Dispatcher<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply `commands` to the devices of `direction`
    pub fn dispatch(&self, direction: Direction, commands: &[Command]) -> DispatchResult {
        let mut result = DispatchResult::default();

        if commands.is_empty() {
            tracing::debug!(%direction, "No commands, skipping enumeration");
            return result;
        }

        let devices = match self.service.enumerate(direction) {
            Ok(devices) => devices,
            Err(e) => {
                result.error = Some(e);
                return result;
            }
        };
        tracing::debug!(
            %direction,
            devices = devices.len(),
            commands = commands.len(),
            "Dispatching"
        );

        for device in &devices {
            let name = match self.service.name_of(device) {
                Ok(name) => name,
                Err(e) => {
                    if self.fail(&mut result, e) {
                        return result;
                    }
                    continue;
                }
            };

            for command in commands {
                if !command.matches(&name) {
                    continue;
                }
                if self.apply(direction, device, &name, command.role, &mut result) {
                    return result;
                }
            }
        }

        tracing::info!(
            %direction,
            applied = result.applied.len(),
            skipped = result.skipped.len(),
            "Dispatch complete"
        );
        result
    }

    /// Set the slots `role` names on one device; unset means both, console first
    ///
    /// Slots set before a failure are recorded one role at a time. Returns
    /// true when the scan must stop.
    fn apply(
        &self,
        direction: Direction,
        device: &S::Device,
        name: &str,
        role: Option<Role>,
        result: &mut DispatchResult,
    ) -> bool {
        let slots = match role {
            Some(role) => vec![role],
            None => Role::ALL.to_vec(),
        };

        let mut set = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Err(e) = self.service.set_default(device, slot) {
                for done in set {
                    tracing::debug!(device = %name, role = %done, "Applied before failure");
                    let applied = Applied::new(direction, Some(done), name);
                    result.applied.push(applied);
                }
                return self.fail(result, e);
            }
            set.push(slot);
        }

        tracing::debug!(device = %name, ?role, "Applied");
        result.applied.push(Applied::new(direction, role, name));
        false
    }

    /// Record a per-device failure; returns true when the scan must stop
    fn fail(&self, result: &mut DispatchResult, error: DispatchError) -> bool {
        match self.policy {
            FailurePolicy::FailFast => {
                result.error = Some(error);
                true
            }
            FailurePolicy::BestEffort => {
                tracing::warn!("Skipping: {}", error);
                result.skipped.push(error);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::InMemoryDevices;

    fn speakers() -> InMemoryDevices {
        InMemoryDevices::new()
            .with_device(Direction::Output, "Speakers A")
            .with_device(Direction::Output, "Speakers B")
    }

    #[test]
    fn test_empty_commands_skip_enumeration() {
        let service = speakers().fail_enumeration(Direction::Output);
        let result = Dispatcher::new(&service).dispatch(Direction::Output, &[]);

        assert!(result.is_ok());
        assert!(result.applied.is_empty());
        assert!(service.enumerate_calls().is_empty());
    }

    #[test]
    fn test_no_role_sets_both_roles_on_every_match() {
        let service = speakers();
        let commands = [Command::new(Direction::Output, None, "Speakers")];

        let applied = Dispatcher::new(&service)
            .dispatch(Direction::Output, &commands)
            .into_result()
            .unwrap();

        assert_eq!(
            service.set_default_calls(),
            vec![
                ("Speakers A".to_string(), Role::Console),
                ("Speakers A".to_string(), Role::Communications),
                ("Speakers B".to_string(), Role::Console),
                ("Speakers B".to_string(), Role::Communications),
            ]
        );
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].device_name, "Speakers A");
        assert_eq!(applied[1].device_name, "Speakers B");
        assert_eq!(
            service.default_for(Direction::Output, Role::Console),
            Some("Speakers B".to_string())
        );
    }

    #[test]
    fn test_explicit_role_sets_one_slot() {
        let service = speakers();
        let command = Command::new(Direction::Output, Some(Role::Communications), "B");

        let applied = Dispatcher::new(&service)
            .dispatch(Direction::Output, &[command])
            .into_result()
            .unwrap();

        assert_eq!(
            service.set_default_calls(),
            vec![("Speakers B".to_string(), Role::Communications)]
        );
        assert_eq!(applied[0].role, Some(Role::Communications));
    }

    #[test]
    fn test_every_command_tested_against_every_device() {
        let service = speakers();
        let commands = [
            Command::new(Direction::Output, Some(Role::Console), "Speakers"),
            Command::new(Direction::Output, Some(Role::Communications), "A"),
        ];

        let applied = Dispatcher::new(&service)
            .dispatch(Direction::Output, &commands)
            .into_result()
            .unwrap();

        let order: Vec<_> = applied
            .iter()
            .map(|a| (a.device_name.as_str(), a.role))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Speakers A", Some(Role::Console)),
                ("Speakers A", Some(Role::Communications)),
                ("Speakers B", Some(Role::Console)),
            ]
        );
    }

    #[test]
    fn test_enumeration_failure_is_fatal() {
        let service = speakers().fail_enumeration(Direction::Output);
        let commands = [Command::new(Direction::Output, None, "Speakers")];

        let result = Dispatcher::new(&service)
            .with_policy(FailurePolicy::BestEffort)
            .dispatch(Direction::Output, &commands);

        assert!(matches!(
            result.error,
            Some(DispatchError::EnumerationFailed { .. })
        ));
        assert!(service.set_default_calls().is_empty());
    }

    #[test]
    fn test_fail_fast_keeps_earlier_applications() {
        let service = InMemoryDevices::new()
            .with_device(Direction::Output, "Speakers A")
            .with_device(Direction::Output, "Speakers B")
            .with_device(Direction::Output, "Speakers C")
            .fail_set_default("Speakers B");
        let command = Command::new(Direction::Output, Some(Role::Console), "Speakers");

        let result = Dispatcher::new(&service)
            .dispatch(Direction::Output, &[command]);

        assert_eq!(result.applied.len(), 1);
        assert!(matches!(
            result.error,
            Some(DispatchError::SetDefaultFailed { .. })
        ));
        // Speakers C never reached
        assert_eq!(service.set_default_calls().len(), 1);
    }

    #[test]
    fn test_best_effort_continues_past_failures() {
        let service = InMemoryDevices::new()
            .with_device(Direction::Input, "Mic A")
            .with_device(Direction::Input, "Mic B")
            .with_device(Direction::Input, "Mic C")
            .fail_name_lookup("Mic A")
            .fail_set_default("Mic B");
        let command = Command::new(Direction::Input, Some(Role::Console), "Mic");

        let result = Dispatcher::new(&service)
            .with_policy(FailurePolicy::BestEffort)
            .dispatch(Direction::Input, &[command]);

        assert!(result.is_ok());
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.applied[0].device_name, "Mic C");
    }

    #[test]
    fn test_fail_fast_stops_on_unreadable_name() {
        let service = speakers().fail_name_lookup("Speakers A");
        let command = Command::new(Direction::Output, Some(Role::Console), "Speakers");

        let result = Dispatcher::new(&service)
            .dispatch(Direction::Output, &[command]);

        assert!(matches!(
            result.error,
            Some(DispatchError::NameLookupFailed { .. })
        ));
        assert!(result.applied.is_empty());
        assert!(result.skipped.is_empty());
        // Speakers B is a match but the scan ended on A
        assert!(service.set_default_calls().is_empty());
    }

    #[test]
    fn test_fail_fast_keeps_console_half_of_fan_out() {
        let service = speakers()
            .fail_set_default_role("Speakers A", Role::Communications);
        let commands = [Command::new(Direction::Output, None, "Speakers")];

        let result = Dispatcher::new(&service)
            .dispatch(Direction::Output, &commands);

        let console_only = Applied::new(Direction::Output, Some(Role::Console), "Speakers A");
        assert_eq!(result.applied, vec![console_only]);
        assert_eq!(
            result.error,
            Some(DispatchError::SetDefaultFailed {
                device: "Speakers A".into(),
                role: Role::Communications,
                reason: "simulated failure".into(),
            })
        );
        assert_eq!(
            service.set_default_calls(),
            vec![("Speakers A".to_string(), Role::Console)]
        );
    }

    #[test]
    fn test_best_effort_records_console_half_of_fan_out() {
        let service = speakers()
            .fail_set_default_role("Speakers A", Role::Communications);
        let commands = [Command::new(Direction::Output, None, "Speakers")];

        let result = Dispatcher::new(&service)
            .with_policy(FailurePolicy::BestEffort)
            .dispatch(Direction::Output, &commands);

        assert!(result.is_ok());
        assert_eq!(
            result.applied,
            vec![
                Applied::new(Direction::Output, Some(Role::Console), "Speakers A"),
                Applied::new(Direction::Output, None, "Speakers B"),
            ]
        );
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(
            result.applied[0].to_string(),
            "set default console playback device to: Speakers A"
        );
        assert_eq!(
            service.default_for(Direction::Output, Role::Communications),
            Some("Speakers B".to_string())
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let service = speakers();
        let commands = [Command::new(Direction::Output, None, "speakers")];

        let applied = Dispatcher::new(&service)
            .dispatch(Direction::Output, &commands)
            .into_result()
            .unwrap();
        assert!(applied.is_empty());
    }

    #[test]
    fn test_incomplete_commands_never_match() {
        let service = speakers();
        let commands = [Command {
            pattern: Some("Speakers".into()),
            ..Default::default()
        }];

        let applied = Dispatcher::new(&service)
            .dispatch(Direction::Output, &commands)
            .into_result()
            .unwrap();
        assert!(applied.is_empty());
        assert_eq!(service.enumerate_calls(), vec![Direction::Output]);
    }

    #[test]
    fn test_confirmation_messages() {
        let applied = Applied {
            direction: Direction::Output,
            role: None,
            device_name: "Speakers (Realtek)".into(),
        };
        assert_eq!(
            applied.to_string(),
            "set default audio playback device to: Speakers (Realtek)"
        );

        let applied = Applied {
            direction: Direction::Input,
            role: Some(Role::Communications),
            device_name: "Headset Mic".into(),
        };
        assert_eq!(
            applied.to_string(),
            "set default communications recording device to: Headset Mic"
        );
    }
}
