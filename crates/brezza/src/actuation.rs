use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::{NOT_SET, timestamp};

/// The kind of actuator a command is addressed to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActuatorKind {
    /// Heating, ventilation and air conditioning unit.
    Hvac,
    /// Humidifier unit.
    Humidifier,
    /// Status LED.
    Led,
}

impl ActuatorKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Hvac => "hvac",
            Self::Humidifier => "humidifier",
            Self::Led => "led",
        }
    }
}

impl core::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.name().fmt(f)
    }
}

/// An actuation directive.
///
/// Only [`Command::On`] and [`Command::Off`] are applicable; any other value
/// reaching an actuator is an invalid-command condition.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// No command has been assigned.
    #[default]
    Unspecified,
    /// Activate the actuator.
    On,
    /// Deactivate the actuator.
    Off,
}

/// Status code of a successfully applied command.
pub const STATUS_OK: i32 = 0;

/// Failure sentinel status code for a command that could not be interpreted.
pub const STATUS_INVALID_COMMAND: i32 = -1;

/// An actuator command or, once applied, its response.
///
/// Commands and responses share this one shape: a command destined for
/// dispatch always has `is_response == false`, while the outcome record of
/// applying it always has `is_response == true` and carries a status code.
///
/// Two commands are duplicates iff their `(command, value, state_data)`
/// triples are equal; duplicate commands are suppressed by the actuator they
/// are addressed to.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Actuation {
    /// The kind of actuator this record is addressed to or originated from.
    pub kind: ActuatorKind,
    /// Actuator name, the cache key for the response.
    pub name: String,
    /// Identifier of the device location this record is addressed to.
    pub location_id: String,
    /// The directive to apply.
    pub command: Command,
    /// Command payload value.
    pub value: f64,
    /// Opaque state payload forwarded to the actuator.
    pub state_data: String,
    /// Result code of the applied command; meaningful on responses only.
    pub status_code: i32,
    /// Distinguishes a response from a dispatchable command.
    pub is_response: bool,
    /// Instant of the last mutation of this record.
    pub timestamp: DateTime<Utc>,
}

impl Actuation {
    /// Creates a dispatchable [`Actuation`] command with an unspecified
    /// directive, a zero value and an unset location.
    #[must_use]
    pub fn command(kind: ActuatorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location_id: NOT_SET.into(),
            command: Command::Unspecified,
            value: 0.,
            state_data: String::new(),
            status_code: STATUS_OK,
            is_response: false,
            timestamp: Utc::now(),
        }
    }

    /// Sets the directive, refreshing the timestamp.
    pub fn set_command(&mut self, command: Command) {
        self.command = command;
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the payload value, refreshing the timestamp.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the opaque state payload, refreshing the timestamp.
    pub fn set_state_data(&mut self, state_data: impl Into<String>) {
        self.state_data = state_data.into();
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the location identifier, refreshing the timestamp.
    pub fn set_location_id(&mut self, location_id: impl Into<String>) {
        self.location_id = location_id.into();
        self.timestamp = timestamp::refresh(self.timestamp);
    }

    /// Sets the directive while constructing an [`Actuation`].
    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.set_command(command);
        self
    }

    /// Sets the payload value while constructing an [`Actuation`].
    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.set_value(value);
        self
    }

    /// Turns this record into the response mirroring its identity fields,
    /// carrying the given status code.
    #[must_use]
    pub fn into_response(mut self, status_code: i32) -> Self {
        self.status_code = status_code;
        self.is_response = true;
        self.timestamp = timestamp::refresh(self.timestamp);
        self
    }

    /// The `(command, value, state_data)` triple used for duplicate
    /// suppression.
    #[must_use]
    pub fn dedup_triple(&self) -> (Command, f64, String) {
        (self.command, self.value, self.state_data.clone())
    }

    /// Encodes this record as a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the record cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a command or response from a JSON string.
    ///
    /// # Errors
    ///
    /// An error is returned when the payload is not a valid record.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

impl core::fmt::Display for Actuation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {:?} for `{}` = {} (location `{}`)",
            if self.is_response {
                "response"
            } else {
                "command"
            },
            self.command,
            self.name,
            self.value,
            self.location_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Actuation, ActuatorKind, Command, STATUS_OK};

    fn hvac_on() -> Actuation {
        Actuation::command(ActuatorKind::Hvac, "hvac")
            .with_command(Command::On)
            .with_value(26.)
    }

    #[test]
    fn command_is_not_a_response() {
        let command = hvac_on();

        assert!(!command.is_response);
        assert_eq!(command.status_code, STATUS_OK);
    }

    #[test]
    fn response_mirrors_identity_fields() {
        let command = hvac_on();
        let response = command.clone().into_response(STATUS_OK);

        assert!(response.is_response);
        assert_eq!(response.kind, command.kind);
        assert_eq!(response.name, command.name);
        assert_eq!(response.command, command.command);
        assert_eq!(response.value, command.value);
        assert!(response.timestamp >= command.timestamp);
    }

    #[test]
    fn duplicate_triples_are_equal() {
        assert_eq!(hvac_on().dedup_triple(), hvac_on().dedup_triple());

        let other = hvac_on().with_value(22.);
        assert_ne!(hvac_on().dedup_triple(), other.dedup_triple());
    }

    #[test]
    fn json_round_trip() {
        let response = hvac_on().into_response(STATUS_OK);

        let decoded = Actuation::from_json(&response.to_json().unwrap()).unwrap();

        assert_eq!(decoded, response);
    }
}
