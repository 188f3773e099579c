// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use serde_json::Value;

/// An opaque telemetry record.
///
/// The buffer never looks inside an event; it only cares that one is present.
/// JSON `null` is the absent event and cannot be wrapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    /// Wraps a JSON value, returning `None` for `null`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            value => Some(Self(value)),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<serde_json::Map<String, Value>> for Event {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(Value::Object(map))
    }
}
