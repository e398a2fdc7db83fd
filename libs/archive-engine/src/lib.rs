//! Архивация лога (topic, partition) в сжатые сегменты object storage.
//!
//! [`StreamDriver`] читает страницы через [`archive_api::LogSource`],
//! пишет их в [`SegmentEncoder`] и коммитит готовые сегменты через
//! [`archive_api::SegmentStore`].

mod driver;
mod encoder;
mod error;

pub use driver::{DEFAULT_ROLLOVER_BYTES, StreamDriver, StreamOptions, StreamSummary};
pub use encoder::{DEFAULT_COMPRESSION_LEVEL, SegmentEncoder};
pub use error::ArchiveError;
