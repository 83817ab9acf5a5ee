#![doc = include_str!("../README.md")]

/// Article and segment assembly into complete files
pub mod assembler;
mod client;
/// NNTP command builders and response parsers
pub mod commands;
mod config;
/// Engine-level error types
mod error;
/// Per-segment download: pool + streaming decode + fallback
pub mod downloader;
/// Engine façade: submit/cancel/pause/delete and the event bus
pub mod engine;
/// Per-segment provider fallback and retry policy
pub mod fallback;
/// Append-only JSON history of completed/failed downloads
pub mod history;
/// NZB file format parser
pub mod nzb;
/// Job orchestration: dispatch, progress, assembly
pub mod orchestrator;
mod pool;
mod response;
/// Events and state reported by the engine
pub mod status;
/// yEnc binary encoding/decoding for Usenet
pub mod yenc;

pub use assembler::{FileAssembler, SegmentOutcome};
pub use client::NntpClient;
pub use commands::ArticleInfo;
pub use config::{EngineConfig, Provider, ProviderStats, ServerConfig};
pub use downloader::{DecodedSegment, SegmentDownloader};
pub use engine::Engine;
pub use error::{NntpError, Result};
pub use fallback::FallbackPolicy;
pub use history::{HistoryEntry, HistoryStore};
pub use nzb::{parse_nzb, Nzb, NzbFile, NzbSegment, StoredSegment};
pub use orchestrator::{DownloadJob, JobOrchestrator};
pub use pool::{NntpPool, RetryConfig};
pub use response::{codes, NntpResponse};
pub use status::{DownloadEvent, DownloadItem, DownloadState};
pub use yenc::{
    decode as yenc_decode, encode as yenc_encode, YencDecoded, YencEnd, YencHeader, YencMetadata,
    YencPart, YencStreamDecoder,
};
