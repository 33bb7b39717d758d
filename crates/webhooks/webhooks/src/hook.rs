//! Webhook subscription model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header name to values, in name order. Values keep insertion order.
pub type Headers = BTreeMap<String, Vec<String>>;

/// A webhook subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebHook {
    /// Unique name.
    pub name: String,
    /// Team that owns this hook.
    #[serde(default)]
    pub team_owner: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Which events trigger this hook.
    #[serde(default)]
    pub event_filter: WebHookEventFilter,
    /// Target URL.
    pub url: String,
    /// Proxy the call is routed through.
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Extra request headers.
    #[serde(default)]
    pub headers: Headers,
    /// HTTP method; POST when empty.
    #[serde(default)]
    pub method: String,
    /// Literal body sent instead of the serialized event.
    #[serde(default)]
    pub body: Option<String>,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

impl WebHook {
    /// Creates a new webhook.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the owning team.
    pub fn team_owner(mut self, team: impl Into<String>) -> Self {
        self.team_owner = team.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Sets the event filter.
    pub fn with_filter(mut self, filter: WebHookEventFilter) -> Self {
        self.event_filter = filter;
        self
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Appends a value for a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Sets a literal body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Routes calls through a proxy.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Skips TLS certificate verification.
    pub fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Returns the literal body, if one is configured and non-empty.
    pub fn literal_body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }
}

/// Describes which events a hook fires on.
///
/// Stored on a [`WebHook`] it acts as a subscription filter, where an empty
/// list matches anything. Built from an event it lists every target and the
/// kind of that event, with `target_types[i]` paired with `target_values[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebHookEventFilter {
    #[serde(default)]
    pub target_types: Vec<String>,
    #[serde(default)]
    pub target_values: Vec<String>,
    #[serde(default)]
    pub kind_types: Vec<String>,
    #[serde(default)]
    pub kind_names: Vec<String>,
    /// Fire only for failed events.
    #[serde(default)]
    pub error_only: bool,
    /// Fire only for successful events.
    #[serde(default)]
    pub success_only: bool,
}

impl WebHookEventFilter {
    /// Creates an empty filter that matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target type.
    pub fn target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_types.push(target_type.into());
        self
    }

    /// Adds a target value.
    pub fn target_value(mut self, value: impl Into<String>) -> Self {
        self.target_values.push(value.into());
        self
    }

    /// Adds a kind type.
    pub fn kind_type(mut self, kind_type: impl Into<String>) -> Self {
        self.kind_types.push(kind_type.into());
        self
    }

    /// Adds a kind name.
    pub fn kind_name(mut self, name: impl Into<String>) -> Self {
        self.kind_names.push(name.into());
        self
    }

    /// Fire only when the event failed.
    pub fn error_only(mut self) -> Self {
        self.error_only = true;
        self
    }

    /// Fire only when the event succeeded.
    pub fn success_only(mut self) -> Self {
        self.success_only = true;
        self
    }

    /// Checks whether a hook with this filter fires for the event described
    /// by `event`. `success` tells whether that event finished without error.
    ///
    /// Each list must be empty or share at least one entry with the event's
    /// list. Successful events skip `error_only` hooks and failed events skip
    /// `success_only` hooks.
    pub fn accepts(&self, event: &WebHookEventFilter, success: bool) -> bool {
        fn intersects(subscribed: &[String], actual: &[String]) -> bool {
            subscribed.is_empty() || subscribed.iter().any(|s| actual.contains(s))
        }

        if success && self.error_only {
            return false;
        }
        if !success && self.success_only {
            return false;
        }

        intersects(&self.target_types, &event.target_types)
            && intersects(&self.target_values, &event.target_values)
            && intersects(&self.kind_types, &event.kind_types)
            && intersects(&self.kind_names, &event.kind_names)
    }
}
