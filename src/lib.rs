//! Semantic columnar compression for homogeneous, JSON-shaped record
//! batches.
//!
//! Given a batch of records that share a loose structural shape, [`compress`]
//! profiles each column's logical type (UUID, timestamp, enum, boolean,
//! number, string, or nested array) and encodes it with a codec tailored to
//! that type, rather than treating the batch as opaque bytes. The result is a
//! self-describing buffer that [`decompress`] losslessly inverts.
//! [`compress_columnar_post`] additionally runs each encoded column through a
//! general-purpose byte compressor, for workloads where chaining both wins.

pub mod bitmap;
pub mod byte_codec;
pub mod codec;
pub mod column;
pub mod compressor;
pub mod config;
pub mod error;
pub mod flatten;
pub mod nullable;
pub mod profiler;
pub mod registry;
pub mod schema;
pub mod value;
pub mod varint;

pub use compressor::{compress, compress_columnar_post, decompress, SemanticCompressor};
pub use config::CompressorOptions;
pub use error::{Result, SajcError};
pub use schema::{BatchHeader, FieldSchema, FieldType};
pub use value::{Record, Value};
