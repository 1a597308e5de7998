//! Error types for the semantic columnar compression engine.

use snafu::{Location, Snafu};

use crate::schema::FieldType;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SajcError {
    #[snafu(display("compress called with an empty batch"))]
    EmptyBatch {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("no codec registered for type {:?}", field_type))]
    NoCodec {
        field_type: FieldType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("round-trip self-check failed for field '{}' of type {:?}", field, field_type))]
    RoundTripFailed {
        field: String,
        field_type: FieldType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("input truncated while reading {}", where_))]
    Truncated {
        where_: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("leading bytes are not a recognized magic (expected SAJC or SJCB)"))]
    InvalidMagic {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("unknown mode byte 0x{byte:02x} for codec '{codec}'"))]
    UnknownMode {
        codec: &'static str,
        byte: u8,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("nullable wrapper count mismatch: expected {expected}, got {got}"))]
    BitmapMismatch {
        expected: usize,
        got: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("dictionary index out of range"))]
    DictIndexOutOfRange {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("varint is too large (more than 5 bytes without terminator)"))]
    VarintOverflow {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("enum dictionary string is too long (>= 255 bytes)"))]
    EnumStringTooLong {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("array-of-primitives/objects row lengths do not sum to flat payload length"))]
    ArrayLengthMismatch {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid utf-8 in string payload: {}", source))]
    Utf8 {
        source: std::string::FromUtf8Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("opaque byte codec failed: {}", source))]
    ByteCodecFailure {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid UUID string '{}'", value))]
    InvalidUuid {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid timestamp string '{}'", value))]
    InvalidTimestamp {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("value does not match the column's profiled type {:?}", field_type))]
    TypeMismatch {
        field_type: FieldType,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = SajcError> = std::result::Result<T, E>;
