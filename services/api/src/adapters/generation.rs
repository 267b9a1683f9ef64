//! services/api/src/adapters/generation.rs
//!
//! This module contains the adapter for the document generation backend.
//! It implements the `GenerationBackend` port from the `core` crate by
//! opening a chunked HTTP response and running every chunk through the
//! core frame decoder.

use async_trait::async_trait;
use draftsmith_core::domain::GenerationRequest;
use draftsmith_core::ports::{EventStream, GenerationBackend, PortError, PortResult};
use draftsmith_core::stream::FrameDecoder;
use futures::StreamExt;
use serde::Serialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationBackend` over the backend's
/// newline-delimited frame protocol.
#[derive(Clone)]
pub struct HttpGenerationAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpGenerationAdapter {
    /// Creates a new `HttpGenerationAdapter`.
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }
}

/// The request body the backend expects.
#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    document_type: &'a str,
    effort: draftsmith_core::domain::ReasoningEffort,
    verbosity: draftsmith_core::domain::Verbosity,
    stream: bool,
}

//=========================================================================================
// `GenerationBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationBackend for HttpGenerationAdapter {
    async fn start_generation(&self, request: &GenerationRequest) -> PortResult<EventStream> {
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            document_type: &request.document_type,
            effort: request.effort,
            verbosity: request.verbosity,
            stream: true,
        };

        let mut http_request = self
            .client
            .post(format!("{}/v1/generations", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Generation request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("Generation request rejected: {}", e)))?;

        let mut chunks = response.bytes_stream();

        // Decode chunks lazily; the stream ends at the first terminal event
        // or transport failure, and dropping it drops the connection.
        let events = async_stream::stream! {
            let mut decoder = FrameDecoder::new();
            let mut finished = false;
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in decoder.feed(&chunk) {
                            finished = event.is_terminal();
                            yield Ok(event);
                            if finished {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(PortError::Unexpected(format!(
                            "Generation stream failed: {}",
                            e
                        )));
                        finished = true;
                    }
                }
                if finished {
                    break;
                }
            }
            if !finished {
                for event in decoder.finish() {
                    yield Ok(event);
                }
            }
        };

        Ok(Box::pin(events))
    }
}
