//! Model serialization
//!
//! The storage manager treats models as opaque values. A [`ModelCodec`] turns
//! them into bytes for an artifact file and back; the format and its
//! compatibility rules belong to the codec.

use serde::de::DeserializeOwned;
use serde::Serialize;

use common::error::BoxError;
use store_config::ModelFormat;

/// Serializes models to artifact bytes and back
pub trait ModelCodec: Send + Sync {
    /// File extension for artifacts written by this codec, without the dot
    fn extension(&self) -> &str;

    /// Serializes a model
    fn encode<M: Serialize + ?Sized>(&self, model: &M) -> Result<Vec<u8>, BoxError>;

    /// Deserializes a model
    fn decode<M: DeserializeOwned>(&self, bytes: &[u8]) -> Result<M, BoxError>;
}

impl ModelCodec for ModelFormat {
    fn extension(&self) -> &str {
        match self {
            ModelFormat::Json => "json",
            ModelFormat::Bincode => "bin",
        }
    }

    fn encode<M: Serialize + ?Sized>(&self, model: &M) -> Result<Vec<u8>, BoxError> {
        match self {
            ModelFormat::Json => serde_json::to_vec_pretty(model).map_err(BoxError::from),
            ModelFormat::Bincode => bincode::serialize(model).map_err(BoxError::from),
        }
    }

    fn decode<M: DeserializeOwned>(&self, bytes: &[u8]) -> Result<M, BoxError> {
        match self {
            ModelFormat::Json => serde_json::from_slice(bytes).map_err(BoxError::from),
            ModelFormat::Bincode => bincode::deserialize(bytes).map_err(BoxError::from),
        }
    }
}
