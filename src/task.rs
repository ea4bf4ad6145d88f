use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of study or work read from user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_hint: Option<String>,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        let description: String = description.into();
        Self {
            description: description.trim().to_string(),
            date_hint: None,
        }
    }

    pub fn with_date_hint(mut self, hint: impl Into<String>) -> Self {
        let hint: String = hint.into();
        self.date_hint = if hint.trim().is_empty() {
            None
        } else {
            Some(hint.trim().to_string())
        };
        self
    }

    /// Text the date extractor should look at: the hint when present,
    /// otherwise the description itself.
    pub fn date_text(&self) -> &str {
        self.date_hint.as_deref().unwrap_or(&self.description)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Split a comma-separated list ("Revit, Shop Drawing") into tasks.
/// Blank entries are dropped.
pub fn parse_task_list(input: &str) -> Vec<Task> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Task::new)
        .collect()
}
