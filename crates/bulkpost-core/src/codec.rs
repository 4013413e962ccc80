//! Serialization seam: payload encode and response decode.
//!
//! Failures here are terminal for the item; the dispatcher never retries a
//! payload that cannot be encoded or a 2xx body that cannot be decoded.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::retry::CodecError;

pub trait Codec: Send + Sync + 'static {
    type Payload: Send + 'static;
    type Response: Clone + Send + Sync + 'static;

    fn encode(&self, payload: &Self::Payload) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, body: &[u8]) -> Result<Self::Response, CodecError>;
}

/// serde_json codec for typed payloads and responses.
pub struct JsonCodec<P, R>(PhantomData<fn(&P) -> R>);

impl<P, R> JsonCodec<P, R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P, R> Default for JsonCodec<P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R> Codec for JsonCodec<P, R>
where
    P: Serialize + Send + 'static,
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Payload = P;
    type Response = R;

    fn encode(&self, payload: &P) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(payload).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, body: &[u8]) -> Result<R, CodecError> {
        serde_json::from_slice(body).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Payloads are raw JSON texts (e.g. lines of a JSON-lines file). Encoding
/// only checks well-formedness and forwards the bytes unchanged; responses
/// decode to `serde_json::Value`, with an empty body decoding to `Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawJsonCodec;

impl Codec for RawJsonCodec {
    type Payload = String;
    type Response = serde_json::Value;

    fn encode(&self, payload: &String) -> Result<Vec<u8>, CodecError> {
        serde_json::from_str::<serde::de::IgnoredAny>(payload)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(payload.as_bytes().to_vec())
    }

    fn decode(&self, body: &[u8]) -> Result<serde_json::Value, CodecError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(body).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
