use std::collections::HashMap;
use std::sync::{Mutex, Weak};

use brezza::actuation::{Actuation, ActuatorKind, Command, STATUS_INVALID_COMMAND};

use tracing::{debug, error, warn};

use crate::listener::MessageSink;

/// The device-specific side of an actuator.
///
/// A driver only knows how to turn its unit on and off; validation,
/// duplicate suppression and response generation are handled by the
/// [`ActuatorSlot`] wrapping it.
pub trait ActuatorDriver: Send {
    /// Activates the unit with the given payload.
    ///
    /// Returns `0` on success, any other value on failure.
    fn activate(&mut self, value: f64, state_data: &str) -> i32;

    /// Deactivates the unit with the given payload.
    ///
    /// Returns `0` on success, any other value on failure.
    fn deactivate(&mut self, value: f64, state_data: &str) -> i32;
}

/// Per-actuator state machine shared by every registered actuator.
///
/// A slot keeps the last *applied* `(command, value, state_data)` triple and
/// suppresses exact repeats of it. The triple is updated unconditionally,
/// even when the driver reports a failure, so repeated identical failing
/// commands are also suppressed after the first attempt.
pub struct ActuatorSlot {
    kind: ActuatorKind,
    name: String,
    last_applied: Option<(Command, f64, String)>,
    latest_response: Option<Actuation>,
    driver: Box<dyn ActuatorDriver>,
}

impl core::fmt::Debug for ActuatorSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorSlot")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("last_applied", &self.last_applied)
            .finish_non_exhaustive()
    }
}

impl ActuatorSlot {
    /// Creates an [`ActuatorSlot`] wrapping the given driver.
    #[must_use]
    pub fn new(kind: ActuatorKind, name: impl Into<String>, driver: Box<dyn ActuatorDriver>) -> Self {
        Self {
            kind,
            name: name.into(),
            last_applied: None,
            latest_response: None,
            driver,
        }
    }

    /// The kind of actuator this slot drives.
    #[must_use]
    pub const fn kind(&self) -> ActuatorKind {
        self.kind
    }

    /// The latest response produced by this slot, if any command has been
    /// applied yet.
    #[must_use]
    pub const fn latest_response(&self) -> Option<&Actuation> {
        self.latest_response.as_ref()
    }

    /// Applies a command to the wrapped driver.
    ///
    /// Returns [`None`] for a command addressed to another actuator kind and
    /// for an exact repeat of the last applied triple; otherwise returns the
    /// response mirroring the command's identity fields.
    pub fn apply(&mut self, command: &Actuation) -> Option<Actuation> {
        if command.kind != self.kind {
            return None;
        }

        let triple = command.dedup_triple();
        if self.last_applied.as_ref() == Some(&triple) {
            debug!(
                "Duplicate command for `{}` actuator suppressed: {:?} {} `{}`",
                self.name, command.command, command.value, command.state_data
            );
            return None;
        }

        let status_code = match command.command {
            Command::On => self.driver.activate(command.value, &command.state_data),
            Command::Off => self.driver.deactivate(command.value, &command.state_data),
            other => {
                error!("Invalid command for `{}` actuator: {other:?}", self.name);
                STATUS_INVALID_COMMAND
            }
        };

        // The triple counts for deduplication even on a failed apply.
        self.last_applied = Some(triple);

        let response = command.clone().into_response(status_code);
        self.latest_response = Some(response.clone());

        Some(response)
    }
}

/// The actuation dispatcher.
///
/// Owns the actuator slots present on this device and performs validated,
/// deduplicated dispatch: commands addressed to another location or to an
/// unregistered actuator kind are ignored, and every applied command notifies
/// the registered listener with its response.
pub struct ActuationDispatcher {
    location_id: String,
    slots: Mutex<HashMap<ActuatorKind, ActuatorSlot>>,
    listener: Weak<dyn MessageSink>,
}

impl core::fmt::Debug for ActuationDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuationDispatcher")
            .field("location_id", &self.location_id)
            .finish_non_exhaustive()
    }
}

impl ActuationDispatcher {
    /// Creates an [`ActuationDispatcher`] for the given location, owning the
    /// given actuator slots.
    #[must_use]
    pub fn new(
        location_id: impl Into<String>,
        slots: Vec<ActuatorSlot>,
        listener: Weak<dyn MessageSink>,
    ) -> Self {
        let slots = slots.into_iter().map(|slot| (slot.kind(), slot)).collect();
        Self {
            location_id: location_id.into(),
            slots: Mutex::new(slots),
            listener,
        }
    }

    /// Dispatches a command to the matching actuator slot.
    ///
    /// Returns [`None`] when the command is a response, is addressed to
    /// another location, targets an unregistered actuator kind, or is
    /// suppressed as a duplicate. On a non-duplicate apply the registered
    /// listener is notified with the response before it is returned.
    pub async fn dispatch(&self, command: &Actuation) -> Option<Actuation> {
        if command.is_response {
            warn!("Actuation request is a response, not a command. Ignoring.");
            return None;
        }

        if command.location_id != self.location_id {
            warn!(
                "Location ID doesn't match, ignoring actuation: (device) `{}` != (command) `{}`",
                self.location_id, command.location_id
            );
            return None;
        }

        let response = {
            let mut slots = self.slots.lock().expect("actuator slots lock poisoned");
            let Some(slot) = slots.get_mut(&command.kind) else {
                warn!(
                    "No actuator registered for kind `{}`. Ignoring actuation.",
                    command.kind
                );
                return None;
            };
            slot.apply(command)?
        };

        if let Some(listener) = self.listener.upgrade() {
            if !listener
                .handle_actuator_command_response(response.clone())
                .await
            {
                warn!("Listener rejected the actuator response for `{}`", response.name);
            }
        }

        Some(response)
    }
}
