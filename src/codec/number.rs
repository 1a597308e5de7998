//! Adaptive three-mode number codec: integer, fixed-point decimal, or raw
//! float, chosen to minimize payload size while staying within tolerance.

use bytes::{Buf, Bytes, BytesMut};
use snafu::{ensure, OptionExt};

use crate::config::CompressorOptions;
use crate::error::{Result, TruncatedSnafu, TypeMismatchSnafu, UnknownModeSnafu};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_zigzag_varint, write_zigzag_varint};

use super::Codec;

const MODE_FLOAT: u8 = 0x00;
const MODE_INTEGER: u8 = 0x01;
const MODE_DECIMAL: u8 = 0x02;

pub struct NumberCodec {
    options: CompressorOptions,
}

impl NumberCodec {
    pub fn new(options: CompressorOptions) -> Self {
        Self { options }
    }
}

impl Codec for NumberCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Number
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        let numbers: Vec<f64> = values
            .iter()
            .map(|v| {
                v.as_number().context(TypeMismatchSnafu {
                    field_type: FieldType::Number,
                })
            })
            .collect::<Result<_>>()?;

        let mut buf = BytesMut::new();

        if numbers.iter().all(|n| is_integer(*n)) {
            buf.extend_from_slice(&[MODE_INTEGER]);
            for n in &numbers {
                write_zigzag_varint(&mut buf, *n as i64);
            }
            return Ok(buf.freeze());
        }

        if let Some(scale) = find_decimal_scale(&numbers, &self.options) {
            buf.extend_from_slice(&[MODE_DECIMAL, scale]);
            let factor = 10f64.powi(scale as i32);
            for n in &numbers {
                write_zigzag_varint(&mut buf, (n * factor).round() as i64);
            }
            return Ok(buf.freeze());
        }

        buf.extend_from_slice(&[MODE_FLOAT]);
        for n in &numbers {
            buf.extend_from_slice(&n.to_le_bytes());
        }
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        ensure!(
            !bytes.is_empty(),
            TruncatedSnafu {
                where_: "number mode byte".to_string()
            }
        );
        let mode = bytes[0];
        let mut input = &bytes[1..];

        let values = match mode {
            MODE_INTEGER => {
                let mut out = Vec::new();
                while !input.is_empty() {
                    let (v, n) = read_zigzag_varint(input)?;
                    input.advance(n);
                    out.push(Value::Number(v as f64));
                }
                out
            }
            MODE_DECIMAL => {
                ensure!(
                    !input.is_empty(),
                    TruncatedSnafu {
                        where_: "number decimal scale".to_string()
                    }
                );
                let scale = input[0];
                input.advance(1);
                let factor = 10f64.powi(scale as i32);
                let mut out = Vec::new();
                while !input.is_empty() {
                    let (v, n) = read_zigzag_varint(input)?;
                    input.advance(n);
                    out.push(Value::Number(v as f64 / factor));
                }
                out
            }
            MODE_FLOAT => {
                ensure!(
                    input.len() % 8 == 0,
                    TruncatedSnafu {
                        where_: "number float payload".to_string()
                    }
                );
                input
                    .chunks_exact(8)
                    .map(|chunk| Value::Number(f64::from_le_bytes(chunk.try_into().unwrap())))
                    .collect()
            }
            other => {
                return UnknownModeSnafu {
                    codec: "number",
                    byte: other,
                }
                .fail()
            }
        };
        Ok(values)
    }
}

fn is_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64
}

/// `2^63` as an `f64`: the least magnitude that overflows `i64` when rounded
/// and cast. Used to reject decimal scales whose scaled value would saturate
/// instead of round-tripping.
const I64_RANGE_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn fits_i64_range(scaled: f64) -> bool {
    scaled > -I64_RANGE_BOUND && scaled < I64_RANGE_BOUND
}

/// Smallest scale in `1..=max_scale` such that every value, multiplied by
/// `10^scale`, is within `tolerance` of an integer and fits in an `i64` once
/// rounded (otherwise the zig-zag varint encode would saturate instead of
/// round-tripping, e.g. for `1e19`).
fn find_decimal_scale(numbers: &[f64], options: &CompressorOptions) -> Option<u8> {
    (1..=options.decimal_max_scale).find(|&scale| {
        let factor = 10f64.powi(scale as i32);
        numbers.iter().all(|n| {
            let scaled = n * factor;
            fits_i64_range(scaled.round()) && (scaled - scaled.round()).abs() < options.decimal_tolerance
        })
    })
}
