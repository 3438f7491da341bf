use std::{fmt, io::Read};

use serde::Serialize;
use thiserror::Error;

use crate::util::sigv4::SigningError;

pub const ENGINE: &str = "standard";
pub const LANGUAGE_CODE: &str = "en-US";
pub const OUTPUT_FORMAT: &str = "mp3";
pub const VOICE_ID: &str = "Joanna";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    MissingSetting(&'static str),
    #[error("invalid Polly endpoint {0}")]
    InvalidEndpoint(String),
    #[error("failed to sign request: {0}")]
    Signing(#[from] SigningError),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request to Polly failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Polly returned HTTP {status} ({kind}): {message}")]
    Service {
        status: u16,
        kind: String,
        message: String,
    },
    #[error("audio stream failed: {0}")]
    Stream(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SynthesisRequest {
    pub engine: String,
    pub language_code: String,
    pub text: String,
    pub output_format: String,
    pub voice_id: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            engine: ENGINE.to_string(),
            language_code: LANGUAGE_CODE.to_string(),
            text: text.into(),
            output_format: OUTPUT_FORMAT.to_string(),
            voice_id: VOICE_ID.to_string(),
        }
    }
}

/// Audio bytes as returned by the service. Dropping it releases the
/// underlying connection.
pub struct AudioStream {
    inner: Box<dyn Read + Send>,
}

impl AudioStream {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }
}

impl Read for AudioStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AudioStream")
    }
}

#[derive(Debug, Default)]
pub struct SynthesisOutput {
    pub audio_stream: Option<AudioStream>,
    pub content_type: Option<String>,
    pub request_characters: Option<u64>,
}

pub trait SpeechService {
    fn synthesize_speech(&self, request: &SynthesisRequest)
        -> Result<SynthesisOutput, ServiceError>;
}

impl<T: SpeechService + ?Sized> SpeechService for &T {
    fn synthesize_speech(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput, ServiceError> {
        (**self).synthesize_speech(request)
    }
}
