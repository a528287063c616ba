use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of an agent trace. Every field may hold any JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub thought: Option<Value>,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub code_output: Option<Value>,
    #[serde(default)]
    pub tool_code: Option<Value>,
    #[serde(default)]
    pub tool_name: Option<Value>,
    #[serde(default)]
    pub tool_output: Option<Value>,
}

impl Step {
    /// Read the known fields of a step value. Non-object steps read as empty.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let field = |name: &str| map.get(name).filter(|v| !v.is_null()).cloned();

        Self {
            thought: field("thought"),
            code: field("code"),
            code_output: field("code_output"),
            tool_code: field("tool_code"),
            tool_name: field("tool_name"),
            tool_output: field("tool_output"),
        }
    }
}
