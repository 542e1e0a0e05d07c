// concept-map-rs/src/prompt.rs
//
// Prompt text sent to the upstream model.

use crate::error::RequestError;
use crate::model::ConceptMapRequest;

const RESPONSE_SHAPE: &str = r#"{
  "target": "concept name",
  "prerequisites": [
    {
      "id": 1,
      "name": "concept name",
      "description": "brief description",
      "prerequisites": [array of prerequisite IDs],
      "level": "foundational|intermediate|advanced"
    }
  ]
}"#;

/// Builds the generation prompt for a request
pub fn build_prompt(request: &ConceptMapRequest) -> Result<String, RequestError> {
    let concept = request.concept().ok_or(RequestError::MissingConcept)?;

    let mut subject_line = format!(
        "Generate a prerequisite knowledge tree for understanding \"{}\"",
        concept
    );
    if let Some(level) = request.level() {
        subject_line.push_str(&format!(" at {} level", level));
    }
    if let Some(subject) = request.subject() {
        subject_line.push_str(&format!(" in {}", subject));
    }
    subject_line.push('.');

    Ok(format!(
        "{}\nReturn ONLY valid JSON (no markdown, no preamble) with this exact structure:\n{}\n\
         Include 5-8 prerequisite concepts arranged in a logical dependency hierarchy. \
         The target concept should be the last item with the highest ID.",
        subject_line, RESPONSE_SHAPE
    ))
}
