use log::debug;
use reqwest::{
    blocking::{Client, Response},
    header::CONTENT_TYPE,
    Url,
};
use serde::Deserialize;
use time::OffsetDateTime;

use super::types::{AudioStream, ServiceError, SpeechService, SynthesisOutput, SynthesisRequest};
use crate::config::AwsSettings;
use crate::util::sigv4::{self, SignableRequest, SigningParams};

const SERVICE: &str = "polly";
const SPEECH_PATH: &str = "v1/speech";

pub struct PollyClient {
    http: Client,
    url: Url,
    host: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl PollyClient {
    pub fn connect(settings: &AwsSettings) -> Result<Self, ServiceError> {
        let region = settings
            .region
            .clone()
            .ok_or(ServiceError::MissingSetting("AWS_REGION"))?;
        let access_key_id = settings
            .access_key_id
            .clone()
            .ok_or(ServiceError::MissingSetting("ACCESS_KEY"))?;
        let secret_access_key = settings
            .secret_access_key
            .clone()
            .ok_or(ServiceError::MissingSetting("SECRET_ACCESS_KEY"))?;

        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://polly.{region}.amazonaws.com"));
        let url = Url::parse(&endpoint)
            .and_then(|base| base.join(SPEECH_PATH))
            .map_err(|err| ServiceError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ServiceError::InvalidEndpoint(endpoint)),
        };

        let http = Client::builder().timeout(None).build()?;

        Ok(Self {
            http,
            url,
            host,
            region,
            access_key_id,
            secret_access_key,
            session_token: settings.session_token.clone(),
        })
    }
}

impl SpeechService for PollyClient {
    fn synthesize_speech(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput, ServiceError> {
        let body = serde_json::to_vec(request)?;
        let signed = sigv4::sign(
            &SigningParams {
                access_key_id: &self.access_key_id,
                secret_access_key: &self.secret_access_key,
                session_token: self.session_token.as_deref(),
                region: &self.region,
                service: SERVICE,
                time: OffsetDateTime::now_utc(),
            },
            &SignableRequest {
                method: "POST",
                host: &self.host,
                path: self.url.path(),
                query: &[],
                headers: &[("content-type", "application/json")],
                payload: &body,
            },
        )?;

        debug!("POST {} ({} bytes)", self.url, body.len());
        let mut builder = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in signed {
            builder = builder.header(name, value);
        }
        let response = builder.body(body).send()?;

        if !response.status().is_success() {
            return Err(service_error(response));
        }

        let content_type = header_str(&response, CONTENT_TYPE.as_str()).map(str::to_string);
        let request_characters =
            header_str(&response, "x-amzn-requestcharacters").and_then(|value| value.parse().ok());
        let audio_stream = match response.content_length() {
            Some(0) => None,
            _ => Some(AudioStream::new(response)),
        };

        Ok(SynthesisOutput {
            audio_stream,
            content_type,
            request_characters,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

fn service_error(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let header_kind = header_str(&response, "x-amzn-errortype")
        .and_then(|value| value.split(':').next())
        .map(str::to_string);
    let text = response.text().unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let kind = header_kind
        .or(body.kind)
        .map(|kind| match kind.rsplit_once('#') {
            Some((_, short)) => short.to_string(),
            None => kind,
        })
        .unwrap_or_else(|| "UnknownError".to_string());
    let message = body.message.unwrap_or_else(|| text.trim().to_string());

    ServiceError::Service {
        status,
        kind,
        message,
    }
}
