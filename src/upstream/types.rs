//! Wire types for the `generateContent` call and the upstream error type.

use axum::http::StatusCode;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substituted when the reply has no text at any level.
pub const FALLBACK_REPLY: &str = "No response from Gemini.";

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> GenerateContentRequest<'a> {
    /// One user turn whose only part is the prompt.
    pub fn single_turn(prompt: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, or the fallback reply.
    pub fn into_reply(self) -> String {
        self.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// Errors from one upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status; body kept verbatim.
    #[error("upstream returned {status}")]
    Status {
        status: StatusCode,
        content_type: Option<String>,
        body: Bytes,
    },

    /// Request never completed or the reply could not be decoded.
    #[error("{0}")]
    Transport(String),
}
