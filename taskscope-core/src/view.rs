//! Step view-model handed to the presentation layer.
//!
//! Comment lines (`#` or `//`) in a step's `code` and `tool_code` are lifted
//! out and shown with the step's thought; the remaining lines are shown as
//! cleaned code.

use crate::archive::LoadedTrace;
use crate::media::{Asset, Kind};
use crate::models::Step;
use crate::resolver::StepImageSet;
use serde_json::Value;

/// Fields rendered verbatim under their title, in this order.
const DISPLAY_FIELDS: [(&str, &str); 3] = [
    ("code_output", "Code Output"),
    ("tool_name", "Tool Name"),
    ("tool_output", "Tool Output"),
];

/// Split code into comment-derived thoughts and the remaining code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitCode {
    pub thoughts: String,
    pub code: String,
}

pub fn split_code_comments(code: Option<&Value>) -> SplitCode {
    let Some(text) = code.and_then(Value::as_str) else {
        return SplitCode::default();
    };

    let mut thoughts = Vec::new();
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('#') {
            thoughts.push(rest.trim());
        } else if let Some(rest) = trimmed.strip_prefix("//") {
            thoughts.push(rest.trim());
        } else {
            lines.push(line);
        }
    }

    SplitCode {
        thoughts: thoughts.join("\n"),
        code: lines.join("\n").trim().to_string(),
    }
}

/// JSON truthiness: null, false, 0 and the empty string are hidden.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a value: strings as-is, containers as indented JSON,
/// primitives in their literal form.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub display_name: String,
    pub name: String,
    pub size: usize,
}

impl From<&Asset> for ImageView {
    fn from(asset: &Asset) -> Self {
        Self {
            display_name: asset.display_name().to_string(),
            name: asset.name.clone(),
            size: asset.data.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub index: usize,
    pub before: Vec<ImageView>,
    pub after: Vec<ImageView>,
    /// Thought, Code, Tool Code, then the verbatim display fields. Empty
    /// sections are omitted.
    pub sections: Vec<Section>,
}

impl StepView {
    pub fn from_step(index: usize, value: &Value, images: Option<&StepImageSet>) -> Self {
        let step = Step::from_value(value);
        let from_tool_code = split_code_comments(step.tool_code.as_ref());
        let from_code = split_code_comments(step.code.as_ref());

        let thought = step
            .thought
            .as_ref()
            .filter(|v| is_truthy(v))
            .map(render_value)
            .unwrap_or_default();
        let thoughts = [thought, from_tool_code.thoughts, from_code.thoughts]
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let mut sections = Vec::new();
        let mut push = |title: &str, body: String| {
            if !body.is_empty() {
                sections.push(Section {
                    title: title.to_string(),
                    body,
                });
            }
        };
        push("Thought", thoughts);
        push("Code", from_code.code);
        push("Tool Code", from_tool_code.code);

        for (field, title) in DISPLAY_FIELDS {
            if let Some(v) = value.get(field).filter(|v| is_truthy(v)) {
                push(title, render_value(v));
            }
        }

        let images_of = |kind: Kind| -> Vec<ImageView> {
            images
                .map(|set| set.get(kind).iter().map(ImageView::from).collect())
                .unwrap_or_default()
        };

        Self {
            index,
            before: images_of(Kind::Before),
            after: images_of(Kind::After),
            sections,
        }
    }

    pub fn has_images(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty()
    }
}

/// What the trace's `steps` field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepsView {
    /// Missing, or a falsy value (null, false, 0, "").
    Absent,
    /// Present and truthy but not an array.
    NotArray,
    Steps(Vec<StepView>),
}

impl StepsView {
    pub fn as_slice(&self) -> Option<&[StepView]> {
        match self {
            Self::Steps(steps) => Some(steps),
            Self::Absent | Self::NotArray => None,
        }
    }
}

/// The whole explorer page for one loaded trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceView {
    pub file_name: String,
    pub question: Option<String>,
    pub response: Option<String>,
    pub steps: StepsView,
}

impl TraceView {
    pub fn build(loaded: &LoadedTrace) -> Self {
        let trace = &loaded.trace;
        let text_of = |v: Option<&Value>| v.filter(|v| is_truthy(v)).map(render_value);

        let steps = match trace.raw_steps() {
            Some(Value::Array(steps)) => StepsView::Steps(
                steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| StepView::from_step(i, step, loaded.step_images(i)))
                    .collect(),
            ),
            Some(other) if is_truthy(other) => StepsView::NotArray,
            _ => StepsView::Absent,
        };

        Self {
            file_name: loaded.file_name.clone(),
            question: text_of(trace.question()),
            response: text_of(trace.response_to_user()),
            steps,
        }
    }
}
