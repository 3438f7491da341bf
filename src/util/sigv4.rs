//! AWS Signature Version 4 request signing.
//!
//! Only the pieces needed for header-based signing of a single request are
//! implemented: canonical request, string to sign, signing key derivation
//! and the `Authorization` header.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{macros::format_description, OffsetDateTime};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("failed to format signing time: {0}")]
    Time(#[from] time::error::Format),
    #[error("HMAC error: {0}")]
    Hmac(#[from] hmac::digest::InvalidLength),
}

pub struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: Option<&'a str>,
    pub region: &'a str,
    pub service: &'a str,
    pub time: OffsetDateTime,
}

pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

/// Returns the headers that must be added to the request, `authorization`
/// last.
pub fn sign(
    params: &SigningParams<'_>,
    request: &SignableRequest<'_>,
) -> Result<Vec<(String, String)>, SigningError> {
    let amz_date = params
        .time
        .format(format_description!("[year][month][day]T[hour][minute][second]Z"))?;
    let date = params
        .time
        .format(format_description!("[year][month][day]"))?;

    let mut added = vec![("x-amz-date".to_string(), amz_date.clone())];
    if let Some(token) = params.session_token {
        added.push(("x-amz-security-token".to_string(), token.to_string()));
    }

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), normalize_value(value)))
        .chain(std::iter::once(("host".to_string(), request.host.to_string())))
        .chain(added.iter().cloned())
        .collect();
    headers.sort();
    headers.dedup_by(|a, b| a.0 == b.0);

    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical = canonical_request(request, &headers, &signed_headers);
    let scope = format!(
        "{date}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical.as_bytes()))
    );

    let key = signing_key(params.secret_access_key, &date, params.region, params.service)?;
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

    added.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            params.access_key_id
        ),
    ));
    Ok(added)
}

fn canonical_request(
    request: &SignableRequest<'_>,
    headers: &[(String, String)],
    signed_headers: &str,
) -> String {
    let path = if request.path.is_empty() {
        "/".to_string()
    } else {
        request
            .path
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/")
    };

    let mut query: Vec<(String, String)> = request
        .query
        .iter()
        .map(|(name, value)| (uri_encode(name), uri_encode(value)))
        .collect();
    query.sort();
    let query = query
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    format!(
        "{}\n{path}\n{query}\n{canonical_headers}\n{signed_headers}\n{}",
        request.method,
        hex::encode(Sha256::digest(request.payload))
    )
}

pub(crate) fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn uri_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
