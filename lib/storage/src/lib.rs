//! # trialmatch Storage
//!
//! Corpus access for trial matching: a disease-scoped [`CorpusStore`]
//! trait, an in-memory store, a read cache, JSON import and binary
//! snapshots with float32 embedding blobs.

pub mod blob;
pub mod cache;
pub mod import;
pub mod snapshot;
pub mod store;

pub use blob::{decode_embedding, encode_embedding};
pub use cache::CachedCorpusStore;
pub use import::{import_corpus, open_corpus, parse_rows, read_records, read_rows, CorpusRow};
pub use snapshot::{CorpusSnapshot, SnapshotCorpusStore, SNAPSHOT_VERSION};
pub use store::{disease_key, CorpusStore, MemoryCorpusStore};
