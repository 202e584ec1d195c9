//! Model artifact storage for Model Store
//!
//! This crate persists serialized models as timestamped artifacts in a local
//! directory and, when enabled, mirrors them to a remote object-store bucket.
//! The newest artifact can be loaded back from whichever backend is active.

pub mod artifact;
pub mod clock;
pub mod codec;
pub mod filesystem;
pub mod manager;
pub mod remote;

// Re-export commonly used types
pub use artifact::{ArtifactName, ArtifactRecord};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::ModelCodec;
pub use filesystem::{FilesystemAdapter, LocalEntry};
pub use manager::{LoadedModel, SaveOutcome, StorageManager};
pub use remote::{ObjectStoreRemote, RemoteObject, RemoteStore};
pub use store_config::{LocalSelection, ModelFormat};
