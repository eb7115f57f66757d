use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::trace;

/// base64url that accepts the payload with or without `=` padding and with
/// non-zero trailing bits.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Claims carried in the payload segment of a bearer token.
///
/// The signature is not verified here. The server stays the authority and the
/// client only reads claims to derive what it displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `user` claim.
    pub fn username(&self) -> Option<&str> {
        self.get("user").and_then(Value::as_str)
    }

    /// Truthiness of the `admin` claim.
    pub fn is_admin(&self) -> bool {
        self.get("admin").map(is_truthy).unwrap_or(false)
    }

    /// The `exp` claim in seconds since epoch.
    pub fn expiration(&self) -> Option<i64> {
        match self.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Extracts the claims of a `header.payload.signature` token.
///
/// Returns `None` for anything that is not exactly three segments with a
/// base64url JSON object in the middle.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        trace!(segments = segments.len(), "token does not have three segments");
        return None;
    }

    // Standard-alphabet payloads are accepted too.
    let segment = segments[1].replace('+', "-").replace('/', "_");
    let payload = match URL_SAFE_LENIENT.decode(segment) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!(error = %e, "token payload is not base64url");
            return None;
        }
    };

    match serde_json::from_slice::<Value>(&payload) {
        Ok(Value::Object(map)) => Some(Claims(map)),
        Ok(_) => {
            trace!("token payload is not a JSON object");
            None
        }
        Err(e) => {
            trace!(error = %e, "token payload is not JSON");
            None
        }
    }
}
