//! On-disk formats: the datastore envelope and the done-migrations file.

pub mod envelope;

pub use envelope::{EnvelopeCodec, StorePayload};
