//! The two stages of the program and the pipeline that chains them.

/// PDF text extraction.
pub mod import_pdf;
/// Orchestration of extraction and synthesis, mapped to an exit status.
pub mod pipeline;
/// Speech synthesis into `speech.mp3`.
pub mod speak;
