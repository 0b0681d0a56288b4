//! Codec interface (spec §6): the pluggable JSON-serialization collaborator.
//! Injected at construction, no global state.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::TychoResult;

/// `serialize<T>(value) -> bytes`, `deserialize_async<T>(stream) -> T`, plus
/// the codec's canonical date/time textual format.
#[async_trait]
pub trait Codec: Send + Sync + 'static {
	fn serialize<T: Serialize + Sync>(&self, value: &T) -> TychoResult<Vec<u8>>;

	/// Deserializes a fully-buffered payload. The Document Engine copies each
	/// row's `Data` column into a pooled buffer before calling this (spec
	/// §4.7 `read_many`), so the codec never needs to hold a cursor open.
	async fn deserialize_async<T: DeserializeOwned>(&self, bytes: Vec<u8>) -> TychoResult<T>;

	/// Canonical round-trip textual format for date/time values, used by the
	/// Filter Builder when comparing against a datetime-flavored path.
	fn date_time_serialization_format(&self) -> &'static str;
}

/// Default codec: `serde_json`, with an RFC 3339 date/time format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[async_trait]
impl Codec for JsonCodec {
	fn serialize<T: Serialize + Sync>(&self, value: &T) -> TychoResult<Vec<u8>> {
		Ok(serde_json::to_vec(value)?)
	}

	async fn deserialize_async<T: DeserializeOwned>(&self, bytes: Vec<u8>) -> TychoResult<T> {
		Ok(serde_json::from_slice(&bytes)?)
	}

	fn date_time_serialization_format(&self) -> &'static str {
		"%Y-%m-%dT%H:%M:%S%.fZ"
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Serialize, Deserialize, PartialEq, Debug)]
	struct Sample {
		a: i32,
		b: Box<str>,
	}

	#[tokio::test]
	async fn roundtrips_through_json() {
		let codec = JsonCodec;
		let original = Sample { a: 1, b: "hi".into() };
		let bytes = codec.serialize(&original).unwrap();
		let decoded: Sample = codec.deserialize_async(bytes).await.unwrap();
		assert_eq!(original, decoded);
	}
}
