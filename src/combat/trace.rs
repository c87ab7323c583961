//! Structured dice-roll event stream for diagnostics.
//!
//! A [TraceCollector] is passed down the attack pipeline. When disabled it records
//! nothing and builds nothing; recording never touches the dice source, so turning
//! tracing on or off cannot change a simulation's outcome.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    #[default]
    Off,
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub event_type: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl CombatEvent {
    pub fn new(event_type: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            stage: stage.into(),
            weapon: None,
            values: Map::new(),
        }
    }

    pub fn weapon(mut self, name: impl Into<String>) -> Self {
        self.weapon = Some(name.into());
        self
    }

    pub fn value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    enabled: bool,
    events: Vec<CombatEvent>,
}

impl TraceCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn from_mode(mode: TraceMode) -> Self {
        Self::new(mode == TraceMode::Events)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn record(&mut self, event: CombatEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    /// Build and record an event only when tracing is on.
    #[inline]
    pub fn record_with<F>(&mut self, build: F)
    where
        F: FnOnce() -> CombatEvent,
    {
        if self.enabled {
            self.events.push(build());
        }
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CombatEvent> {
        self.events
    }
}

pub fn serialize_events_json(events: &[CombatEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}
