//! Video ingestion: from an uploaded clip to a persisted portfolio entry.

pub mod ingest;
