pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod time;
