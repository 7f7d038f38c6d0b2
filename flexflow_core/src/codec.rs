//! Plan share tokens and import links.
//!
//! A token is `base64(percent_encode(json(plan)))`, embedded in links of the
//! form `<origin>/import?data=<token>`. The percent-encoding uses the
//! `encodeURIComponent` character set so tokens produced by the web client
//! decode here and vice versa.

use crate::{Error, Result, WorkoutPlan};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;
use uuid::Uuid;

/// Characters left unescaped by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Standard alphabet, padding optional on decode
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub const INVALID_LINK: &str = "link is invalid";
pub const MISSING_DATA: &str = "missing data parameter";

/// Query parameter carrying the token
const DATA_PARAM: &str = "data";

/// Encode a plan into a share token
pub fn encode(plan: &WorkoutPlan) -> Result<String> {
    let json = serde_json::to_string(plan)?;
    let escaped = utf8_percent_encode(&json, URI_COMPONENT).to_string();
    Ok(STANDARD.encode(escaped))
}

/// Decode a share token back into a plan.
///
/// Every failure (base64, percent-encoding, JSON, or a JSON value that is not
/// shaped like a plan) is reported as [`Error::MalformedShareLink`]. The
/// decoded id is kept as-is; use [`with_fresh_id`] before persisting.
pub fn decode(token: &str) -> Result<WorkoutPlan> {
    // A '+' in an unescaped query string arrives as a space
    let cleaned: String = token
        .trim()
        .chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = LENIENT.decode(cleaned.as_bytes()).map_err(|e| malformed("base64", e))?;
    let escaped = String::from_utf8(bytes).map_err(|e| malformed("utf-8", e))?;
    let json = strict_percent_decode(&escaped)?;
    let plan: WorkoutPlan = serde_json::from_str(&json).map_err(|e| malformed("json", e))?;

    tracing::debug!("Decoded shared plan {:?} with {} steps", plan.name, plan.actions.len());
    Ok(plan)
}

/// Replace a decoded plan's id so an import never overwrites an existing plan
pub fn with_fresh_id(mut plan: WorkoutPlan) -> WorkoutPlan {
    plan.id = Uuid::new_v4().to_string();
    plan
}

/// Build `<origin>/import?data=<token>` for a plan
pub fn share_link(origin: &str, plan: &WorkoutPlan) -> Result<String> {
    let token = encode(plan)?;
    let base = format!("{}/import", origin.trim().trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .map_err(|e| Error::Config(format!("invalid share origin {:?}: {}", origin, e)))?;
    url.query_pairs_mut().append_pair(DATA_PARAM, &token);
    Ok(url.into())
}

/// Extract the token from a pasted import link
pub fn token_from_link(link: &str) -> Result<String> {
    let url = Url::parse(link.trim()).map_err(|e| {
        tracing::debug!("Rejecting import link: {}", e);
        Error::MalformedShareLink(INVALID_LINK.into())
    })?;

    url.query_pairs()
        .find(|(key, _)| key == DATA_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::MalformedShareLink(MISSING_DATA.into()))
}

/// Decode a pasted link into a plan with a newly generated id
pub fn import_from_link(link: &str) -> Result<WorkoutPlan> {
    let token = token_from_link(link)?;
    decode(&token).map(with_fresh_id)
}

fn malformed(stage: &str, err: impl std::fmt::Display) -> Error {
    tracing::debug!("Share token rejected at {} stage: {}", stage, err);
    Error::MalformedShareLink(INVALID_LINK.into())
}

/// Percent-decode, rejecting stray '%' the way `decodeURIComponent` does
fn strict_percent_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(malformed("percent", format!("bad escape at byte {}", i)));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| malformed("percent", e))
}
