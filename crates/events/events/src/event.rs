//! Event records.
//!
//! An event records one action performed against a target (an app, a team,
//! a node...). Webhook subscriptions are matched against the event's targets
//! and kind, and the whole record is what gets serialized as a webhook body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The object an event acted upon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Target {
    /// Target type (e.g., "app", "team", "node").
    #[serde(rename = "type")]
    pub target_type: String,
    /// Target value (e.g., the app name).
    pub value: String,
}

impl Target {
    /// Creates a new target.
    pub fn new(target_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.target_type, self.value)
    }
}

/// A secondary target attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraTarget {
    /// The target itself.
    pub target: Target,
    /// Whether the target should be locked while the event runs.
    #[serde(default)]
    pub lock: bool,
}

impl From<Target> for ExtraTarget {
    fn from(target: Target) -> Self {
        Self { target, lock: false }
    }
}

/// Category of an event kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KindType {
    /// Action triggered by a user holding a permission.
    Permission,
    /// Action triggered by the platform itself.
    Internal,
}

impl KindType {
    /// Returns the wire name of the kind type.
    pub fn as_str(&self) -> &'static str {
        match self {
            KindType::Permission => "permission",
            KindType::Internal => "internal",
        }
    }
}

impl std::fmt::Display for KindType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of action the event records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Kind {
    /// Kind type.
    #[serde(rename = "type")]
    pub kind_type: KindType,
    /// Kind name (e.g., "app.deploy").
    pub name: String,
}

impl Kind {
    /// Creates a permission kind.
    pub fn permission(name: impl Into<String>) -> Self {
        Self {
            kind_type: KindType::Permission,
            name: name.into(),
        }
    }

    /// Creates an internal kind.
    pub fn internal(name: impl Into<String>) -> Self {
        Self {
            kind_type: KindType::Internal,
            name: name.into(),
        }
    }
}

/// A recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event.
    pub id: String,
    /// Primary target.
    pub target: Target,
    /// Secondary targets, in the order they were attached.
    #[serde(default)]
    pub extra_targets: Vec<ExtraTarget>,
    /// Event kind.
    pub kind: Kind,
    /// Who triggered the event.
    pub owner: String,
    /// When the event started.
    pub start_time: DateTime<Utc>,
    /// When the event finished.
    pub end_time: Option<DateTime<Utc>>,
    /// Whether the event is still running.
    pub running: bool,
    /// Error message; empty when the event succeeded.
    #[serde(default)]
    pub error: String,
    /// Arbitrary data attached by the emitter.
    #[serde(default)]
    pub custom_data: Value,
}

impl Event {
    /// Creates a new running event.
    pub fn new(target: Target, kind: Kind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target,
            extra_targets: Vec::new(),
            kind,
            owner: String::new(),
            start_time: Utc::now(),
            end_time: None,
            running: true,
            error: String::new(),
            custom_data: Value::Null,
        }
    }

    /// Adds a secondary target.
    pub fn with_extra_target(mut self, target: Target) -> Self {
        self.extra_targets.push(target.into());
        self
    }

    /// Sets the owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Attaches custom data.
    pub fn with_custom_data(mut self, data: impl Serialize) -> Self {
        self.custom_data = serde_json::to_value(data).unwrap_or(Value::Null);
        self
    }

    /// Records an error on the event.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    /// Marks the event as finished, recording `error` (empty on success).
    pub fn finish(&mut self, error: impl Into<String>) {
        self.running = false;
        self.end_time = Some(Utc::now());
        self.error = error.into();
    }

    /// Returns true when the event finished without error.
    pub fn succeeded(&self) -> bool {
        self.error.is_empty()
    }

    /// Iterates over every target: the primary one first, then the extras.
    pub fn all_targets(&self) -> impl Iterator<Item = &Target> {
        std::iter::once(&self.target).chain(self.extra_targets.iter().map(|t| &t.target))
    }
}
