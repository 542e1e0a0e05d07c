//! Upstream generative-AI client
//!
//! [`UpstreamClient`] is the seam the concept-map pipeline calls through.
//! [`GeminiClient`] talks to the Gemini HTTP API; [`ScriptedUpstream`]
//! replays canned outcomes for tests and is only built with the
//! `test-util` feature.

pub mod client;
pub mod error;
pub mod gemini;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use client::{UpstreamClient, UpstreamResponse};
pub use error::{TransportSignal, UpstreamError};
pub use gemini::GeminiClient;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedUpstream;
