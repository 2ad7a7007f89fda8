//! OAuth 1.0a request signing (HMAC-SHA1, see [RFC 5849](https://tools.ietf.org/html/rfc5849))

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use url::Url;
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::error::{PortalError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Everything but the RFC 3986 unreserved characters
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// The `oauth_*` parameters of a signed request
#[derive(Clone, Debug, PartialEq)]
pub struct SignedRequestParams {
    params: Vec<(String, String)>,
}

impl SignedRequestParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn signature(&self) -> &str {
        self.get("oauth_signature").unwrap_or_default()
    }

    /// The value of the `Authorization` header to attach to the request
    pub fn authorization_header(&self) -> String {
        let fields: Vec<String> = self.params.iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }
}

/// Sign a request with a fresh nonce and the current time
pub fn sign(method: &str, url: &Url, credentials: &CredentialStore) -> Result<SignedRequestParams> {
    let nonce = Uuid::new_v4().to_simple().to_string();
    let timestamp = chrono::Utc::now().timestamp();
    sign_with(method, url, credentials, &nonce, timestamp)
}

/// Sign a request with an explicit nonce and timestamp.
///
/// This is a pure function of its inputs.
pub fn sign_with(method: &str, url: &Url, credentials: &CredentialStore, nonce: &str, timestamp: i64) -> Result<SignedRequestParams> {
    let (consumer_key, consumer_secret, token, token_secret) = credentials.signing_keys()?;

    let mut params = vec![
        ("oauth_consumer_key".to_string(), consumer_key.to_string()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), token.to_string()),
        ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
    ];

    let base_string = signature_base_string(method, url, &params);
    log::trace!("OAuth base string: {}", base_string);

    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|err| PortalError::Signing(err.to_string()))?;
    mac.update(base_string.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    params.push(("oauth_signature".to_string(), signature));
    Ok(SignedRequestParams { params })
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// `scheme://host[:port]/path`, lowercase, without default ports, query or fragment
fn base_url(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", scheme, host, port, url.path()),
        None => format!("{}://{}{}", scheme, host, url.path()),
    }
}

fn signature_base_string(method: &str, url: &Url, oauth_params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = url.query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let normalized = pairs.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&normalized))
}
