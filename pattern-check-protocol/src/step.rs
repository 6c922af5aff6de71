use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status tag attached to an execution step update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StepStatus {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "canceled")]
    Canceled,
    #[serde(rename = "noPatternMatch")]
    NoPatternMatch,
}

impl StepStatus {
    /// Whether no further updates are expected for the step once this status is set.
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Canceled => "canceled",
            StepStatus::NoPatternMatch => "noPatternMatch",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single human readable entry in a step's log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StepMessage {
    Line(String),
    Block { title: String, lines: Vec<String> },
}

impl StepMessage {
    pub fn line(text: impl Into<String>) -> Self {
        StepMessage::Line(text.into())
    }

    pub fn block(title: impl Into<String>, lines: Vec<String>) -> Self {
        StepMessage::Block {
            title: title.into(),
            lines,
        }
    }

    /// Returns the message lines, flattening titled blocks.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            StepMessage::Line(line) => vec![line.as_str()],
            StepMessage::Block { lines, .. } => lines.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for StepMessage {
    fn from(value: &str) -> Self {
        StepMessage::line(value)
    }
}

impl From<String> for StepMessage {
    fn from(value: String) -> Self {
        StepMessage::Line(value)
    }
}

/// Progress update for one execution step, as forwarded to the step backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepUpdate {
    pub execution_id: Uuid,
    #[serde(rename = "id")]
    pub step_id: Uuid,
    #[serde(default)]
    pub messages: Vec<StepMessage>,
    /// `None` leaves the step status as it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepUpdate {
    pub fn builder(execution_id: Uuid, step_id: Uuid) -> StepUpdateBuilder {
        StepUpdateBuilder {
            update: StepUpdate {
                execution_id,
                step_id,
                messages: Vec::new(),
                status: None,
                started_at: None,
                finished_at: None,
            },
        }
    }

    /// Whether this update closes the step.
    pub fn is_terminal(&self) -> bool {
        self.status.map(StepStatus::is_terminal).unwrap_or(false)
    }

    /// All message lines of the update, in order.
    pub fn lines(&self) -> Vec<&str> {
        self.messages.iter().flat_map(StepMessage::lines).collect()
    }
}

/// Builder helper to assemble step updates.
pub struct StepUpdateBuilder {
    update: StepUpdate,
}

impl StepUpdateBuilder {
    pub fn message(mut self, message: impl Into<StepMessage>) -> Self {
        self.update.messages.push(message.into());
        self
    }

    pub fn status(mut self, status: StepStatus) -> Self {
        self.update.status = Some(status);
        self
    }

    pub fn started_now(mut self) -> Self {
        self.update.started_at = Some(Utc::now());
        self
    }

    pub fn finished_now(mut self) -> Self {
        self.update.finished_at = Some(Utc::now());
        self
    }

    pub fn build(self) -> StepUpdate {
        self.update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_status_tags_like_the_backend_expects() {
        let update = StepUpdate::builder(Uuid::nil(), Uuid::nil())
            .message("Some patterns did not match. Cancel execution")
            .status(StepStatus::NoPatternMatch)
            .build();

        let value = serde_json::to_value(&update).expect("serialize");
        assert_eq!(value["status"], json!("noPatternMatch"));
        assert_eq!(
            value["messages"],
            json!(["Some patterns did not match. Cancel execution"])
        );
        assert!(value.get("started_at").is_none());
    }

    #[test]
    fn running_is_the_only_non_terminal_status() {
        assert!(!StepStatus::Running.is_terminal());
        assert!(StepStatus::Success.is_terminal());
        assert!(StepStatus::Canceled.is_terminal());
        assert!(StepStatus::NoPatternMatch.is_terminal());

        let plain = StepUpdate::builder(Uuid::nil(), Uuid::nil())
            .message("progress")
            .build();
        assert!(!plain.is_terminal());
    }

    #[test]
    fn flattens_titled_blocks() {
        let update = StepUpdate::builder(Uuid::nil(), Uuid::nil())
            .message(StepMessage::block(
                "Patterns",
                vec!["first".into(), "second".into()],
            ))
            .message("third")
            .build();

        assert_eq!(update.lines(), vec!["first", "second", "third"]);
        let value = serde_json::to_value(&update.messages[0]).expect("serialize");
        assert_eq!(value["title"], json!("Patterns"));
    }
}
