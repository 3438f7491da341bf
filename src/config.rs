use std::{fmt, path::PathBuf};

pub const OUTPUT_FILE: &str = "speech.mp3";

/// Credentials and endpoint used to reach Amazon Polly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint: Option<String>,
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pdf_file: Option<PathBuf>,
    pub aws: AwsSettings,
    pub output_path: PathBuf,
    /// File logging is enabled only when a directory is configured.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env` when present and resolves every setting from the
    /// process environment. Missing values are kept as `None`; the stage
    /// that needs them reports the failure.
    pub fn from_env() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                eprintln!("Ignoring unreadable .env file: {err}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            pdf_file: value("PDF_FILE").map(PathBuf::from),
            aws: AwsSettings {
                region: value("AWS_REGION"),
                access_key_id: value("ACCESS_KEY"),
                secret_access_key: value("SECRET_ACCESS_KEY"),
                session_token: value("AWS_SESSION_TOKEN"),
                endpoint: value("POLLY_ENDPOINT"),
            },
            output_path: PathBuf::from(OUTPUT_FILE),
            log_dir: value("PDF_SPEECH_LOG_DIR").map(PathBuf::from),
        }
    }
}
