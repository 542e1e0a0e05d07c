//! # Concept Map Pipeline
//!
//! Turns free-text completions from a generative model into validated
//! prerequisite trees.
//!
//! ## Stages
//!
//! - [`prompt`]: request validation and prompt text
//! - [`sanitizer`]: code-fence stripping
//! - [`schema`]: JSON parsing and schema validation
//! - [`integrity`]: cross-reference checks between nodes
//! - [`pipeline`]: composition of the above around a retried upstream call
//!

pub mod error;
pub mod integrity;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;
pub mod schema;

pub use error::{RequestError, ResponseError, MISSING_CONCEPT_MESSAGE};
pub use integrity::check_integrity;
pub use model::{ConceptMap, ConceptMapRequest, Level, PrerequisiteNode};
pub use pipeline::ConceptMapPipeline;
pub use prompt::build_prompt;
pub use sanitizer::sanitize;
pub use schema::validate;
