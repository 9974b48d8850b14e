use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::digest::InvalidLength;
use hmac::Hmac;
use hmac::Mac;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Consumer and token credentials for an OAuth 1.0a request.
pub struct OAuth1Credentials<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub token: &'a str,
    pub token_secret: &'a str,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE).to_string()
}

/// Build the `Authorization: OAuth ...` header value for a request (HMAC-SHA1).
///
/// Query parameters of `url` take part in the signature.
pub fn authorization_header(
    method: &str,
    url: &str,
    credentials: &OAuth1Credentials<'_>,
    nonce: &str,
    timestamp: i64,
) -> Result<String, InvalidLength> {
    let (base_url, query) = url.split_once('?').unwrap_or((url, ""));
    let timestamp = timestamp.to_string();

    let oauth_params = [
        ("oauth_consumer_key", credentials.consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.token),
        ("oauth_version", "1.0"),
    ];

    let mut signed: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    signed.extend(
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    encode(&percent_decode_str(k).decode_utf8_lossy()),
                    encode(&percent_decode_str(v).decode_utf8_lossy()),
                )
            }),
    );
    signed.sort();

    let parameter_string = signed
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(credentials.consumer_secret),
        encode(credentials.token_secret)
    );

    let signature = sign(&signing_key, &base_string)?;

    let mut header_params: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
        .collect();
    header_params.push(format!("oauth_signature=\"{}\"", encode(&signature)));

    Ok(format!("OAuth {}", header_params.join(", ")))
}

fn sign(key: &str, base_string: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
