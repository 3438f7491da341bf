use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::polly::{ServiceError, SpeechService, SynthesisRequest};

pub const ERROR_REMOTE_SERVICE: &str = "REMOTE_SERVICE_ERROR";
pub const ERROR_MISSING_AUDIO: &str = "MISSING_AUDIO";
pub const ERROR_OUTPUT_WRITE: &str = "OUTPUT_WRITE_ERROR";

/// Billed-character limit Polly applies to a single request.
const MAX_BILLED_CHARACTERS: usize = 3000;

#[derive(Debug, Error)]
pub enum SynthesisFailure {
    #[error("speech synthesis failed: {0}")]
    RemoteService(#[from] ServiceError),
    #[error("Could not stream audio")]
    MissingAudio,
    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SynthesisFailure {
    pub fn code(&self) -> &'static str {
        match self {
            SynthesisFailure::RemoteService(_) => ERROR_REMOTE_SERVICE,
            SynthesisFailure::MissingAudio => ERROR_MISSING_AUDIO,
            SynthesisFailure::OutputWrite { .. } => ERROR_OUTPUT_WRITE,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct SpeakResponse {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub duration_ms: u128,
}

/// Sends `text` to the service with the fixed voice settings and stores the
/// returned audio at `output_path`, replacing any previous file.
pub fn synthesize(
    service: &dyn SpeechService,
    text: &str,
    output_path: &Path,
) -> Result<SpeakResponse, SynthesisFailure> {
    let start = Instant::now();
    let characters = text.chars().count();
    if characters > MAX_BILLED_CHARACTERS {
        warn!(
            "Text has {characters} characters, above the {MAX_BILLED_CHARACTERS} Polly accepts per request"
        );
    }

    let request = SynthesisRequest::new(text);
    info!(
        "Requesting speech for {characters} characters with voice {} ({}, {})",
        request.voice_id, request.language_code, request.engine
    );
    let output = service.synthesize_speech(&request)?;
    if let Some(billed) = output.request_characters {
        info!("Polly billed {billed} characters");
    }
    if let Some(content_type) = &output.content_type {
        debug!("Audio stream content type: {content_type}");
    }

    let mut stream = output.audio_stream.ok_or(SynthesisFailure::MissingAudio)?;
    let mut audio = Vec::new();
    stream
        .read_to_end(&mut audio)
        .map_err(ServiceError::Stream)?;
    drop(stream);

    let write_failure = |source| SynthesisFailure::OutputWrite {
        path: output_path.to_path_buf(),
        source,
    };
    let mut file = File::create(output_path).map_err(write_failure)?;
    file.write_all(&audio).map_err(write_failure)?;
    file.flush().map_err(write_failure)?;

    let response = SpeakResponse {
        output_path: output_path.to_path_buf(),
        bytes_written: audio.len(),
        duration_ms: start.elapsed().as_millis(),
    };
    info!(
        "Wrote {} bytes of audio to {}",
        response.bytes_written,
        response.output_path.display()
    );
    Ok(response)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::polly::{AudioStream, SynthesisOutput};
    use assert_fs::{prelude::*, TempDir};
    use std::{
        cell::RefCell,
        io::{self, Cursor},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    };

    pub(crate) enum Reply {
        Audio(Vec<u8>),
        NoAudio,
        Fail(u16),
        BrokenStream,
    }

    /// Stands in for Polly and remembers every request it was given.
    pub(crate) struct FakeService {
        reply: Reply,
        pub(crate) requests: RefCell<Vec<SynthesisRequest>>,
        pub(crate) consumed: Arc<AtomicBool>,
    }

    impl FakeService {
        pub(crate) fn new(reply: Reply) -> Self {
            Self {
                reply,
                requests: RefCell::new(Vec::new()),
                consumed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    /// Flags `consumed` once the payload has been read to the end.
    struct TrackedReader {
        inner: Cursor<Vec<u8>>,
        consumed: Arc<AtomicBool>,
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let read = self.inner.read(buf)?;
            if read == 0 {
                self.consumed.store(true, Ordering::SeqCst);
            }
            Ok(read)
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    impl SpeechService for FakeService {
        fn synthesize_speech(
            &self,
            request: &SynthesisRequest,
        ) -> Result<SynthesisOutput, ServiceError> {
            self.requests.borrow_mut().push(request.clone());
            match &self.reply {
                Reply::Audio(bytes) => Ok(SynthesisOutput {
                    audio_stream: Some(AudioStream::new(TrackedReader {
                        inner: Cursor::new(bytes.clone()),
                        consumed: self.consumed.clone(),
                    })),
                    content_type: Some("audio/mpeg".into()),
                    request_characters: Some(request.text.chars().count() as u64),
                }),
                Reply::NoAudio => Ok(SynthesisOutput::default()),
                Reply::Fail(status) => Err(ServiceError::Service {
                    status: *status,
                    kind: "ThrottlingException".into(),
                    message: "Rate exceeded".into(),
                }),
                Reply::BrokenStream => Ok(SynthesisOutput {
                    audio_stream: Some(AudioStream::new(BrokenReader)),
                    ..SynthesisOutput::default()
                }),
            }
        }
    }

    #[test]
    fn writes_payload_byte_for_byte() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("speech.mp3");
        let payload = vec![0x49, 0x44, 0x33, 0x00, 0xff, 0xfb, 0x90];
        let service = FakeService::new(Reply::Audio(payload.clone()));

        let response = synthesize(&service, "Hello world", output.path()).unwrap();

        assert_eq!(response.bytes_written, payload.len());
        assert_eq!(std::fs::read(output.path()).unwrap(), payload);
        let requests = service.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], SynthesisRequest::new("Hello world"));
    }

    #[test]
    fn overwrites_existing_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("speech.mp3");
        output.write_str("previous contents that are longer").unwrap();
        let service = FakeService::new(Reply::Audio(b"new".to_vec()));

        synthesize(&service, "text", output.path()).unwrap();

        assert_eq!(std::fs::read(output.path()).unwrap(), b"new");
    }

    #[test]
    fn empty_text_is_sent_unchanged() {
        let temp = TempDir::new().unwrap();
        let service = FakeService::new(Reply::Audio(b"a".to_vec()));
        synthesize(&service, "", &temp.path().join("speech.mp3")).unwrap();
        assert_eq!(service.requests.borrow()[0].text, "");
    }

    #[test]
    fn missing_audio_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("speech.mp3");
        let service = FakeService::new(Reply::NoAudio);

        let err = synthesize(&service, "Hello", output.path()).unwrap_err();

        assert!(matches!(err, SynthesisFailure::MissingAudio));
        assert_eq!(err.code(), ERROR_MISSING_AUDIO);
        assert!(!output.path().exists());
    }

    #[test]
    fn service_error_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("speech.mp3");
        let service = FakeService::new(Reply::Fail(400));

        let err = synthesize(&service, "Hello", output.path()).unwrap_err();

        assert_eq!(err.code(), ERROR_REMOTE_SERVICE);
        assert!(err.to_string().contains("ThrottlingException"));
        assert!(!output.path().exists());
    }

    #[test]
    fn broken_stream_is_a_remote_failure() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("speech.mp3");
        let service = FakeService::new(Reply::BrokenStream);

        let err = synthesize(&service, "Hello", output.path()).unwrap_err();

        assert!(matches!(
            err,
            SynthesisFailure::RemoteService(ServiceError::Stream(_))
        ));
        assert!(!output.path().exists());
    }

    #[test]
    fn unwritable_output_fails_after_stream_is_consumed() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("missing-dir").join("speech.mp3");
        let service = FakeService::new(Reply::Audio(b"audio".to_vec()));

        let err = synthesize(&service, "Hello", &output).unwrap_err();

        assert_eq!(err.code(), ERROR_OUTPUT_WRITE);
        assert!(service.consumed.load(Ordering::SeqCst));
        assert!(!output.exists());
    }
}
