use serde::{Serialize, Serializer};
use serde_json::Value;

/// A normalized trace file. Unknown fields are retained for export.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceDocument {
    value: Value,
}

impl TraceDocument {
    /// Wrap an already-normalized value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn question(&self) -> Option<&Value> {
        self.value.get("question")
    }

    pub fn response_to_user(&self) -> Option<&Value> {
        self.value.get("response_to_user")
    }

    /// The `steps` field as stored, whatever its shape.
    pub fn raw_steps(&self) -> Option<&Value> {
        self.value.get("steps")
    }

    /// The `steps` sequence, or `None` when absent or not an array.
    pub fn steps(&self) -> Option<&[Value]> {
        self.value.get("steps").and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Serialize for TraceDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
