// concept-map-rs/src/model.rs
//
// Request and response shapes of the concept-map pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters of a concept-map request as received from the HTTP layer
///
/// Every field is optional on the wire; [`ConceptMapRequest::concept`] is the
/// presence check the pipeline relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptMapRequest {
    pub concept: Option<String>,
    pub level: Option<String>,
    pub subject: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ConceptMapRequest {
    pub fn new(concept: impl Into<String>) -> Self {
        Self {
            concept: Some(concept.into()),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// The concept, trimmed; `None` when absent or blank
    pub fn concept(&self) -> Option<&str> {
        non_blank(&self.concept)
    }

    pub fn level(&self) -> Option<&str> {
        non_blank(&self.level)
    }

    pub fn subject(&self) -> Option<&str> {
        non_blank(&self.subject)
    }
}

/// Difficulty tier of a prerequisite node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Foundational,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Foundational, Level::Intermediate, Level::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Foundational => "foundational",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concept in the dependency tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteNode {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Ids of the nodes this one depends on
    #[serde(default)]
    pub prerequisites: Vec<u64>,
    pub level: Level,
}

/// A validated prerequisite tree for a target concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMap {
    pub target: String,
    pub prerequisites: Vec<PrerequisiteNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_blank_fields_are_absent() {
        let request: ConceptMapRequest =
            serde_json::from_value(json!({"concept": "  ", "level": "", "subject": "Physics"})).unwrap();
        assert_eq!(request.concept(), None);
        assert_eq!(request.level(), None);
        assert_eq!(request.subject(), Some("Physics"));

        let request: ConceptMapRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, ConceptMapRequest::default());
    }

    #[test]
    fn test_request_builder_trims() {
        let request = ConceptMapRequest::new(" React ").with_level("beginner");
        assert_eq!(request.concept(), Some("React"));
        assert_eq!(request.level(), Some("beginner"));
    }

    #[test]
    fn test_node_prerequisites_default_to_empty() {
        let node: PrerequisiteNode = serde_json::from_value(json!({
            "id": 1,
            "name": "JavaScript",
            "description": "Learn JS",
            "level": "foundational"
        }))
        .unwrap();
        assert!(node.prerequisites.is_empty());
        assert_eq!(node.level, Level::Foundational);
    }

    #[test]
    fn test_level_serialization() {
        for level in Level::ALL {
            assert_eq!(serde_json::to_value(level).unwrap(), json!(level.as_str()));
        }
        assert!(serde_json::from_value::<Level>(json!("expert")).is_err());
    }
}
