//! Remote speech synthesis.
//!
//! [`SpeechService`] is the single capability the synthesizer depends on;
//! [`PollyClient`] implements it against Amazon Polly so tests can swap in a
//! fake without touching the network.

pub mod client;
pub mod types;

pub use client::PollyClient;
pub use types::{AudioStream, ServiceError, SpeechService, SynthesisOutput, SynthesisRequest};
