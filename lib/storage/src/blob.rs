//! Little-endian float32 embedding blobs.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use trialmatch_core::{Error, Result, Vector};

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Decode a stored embedding blob.
///
/// The blob length must be a whole number of float32 values, and equal to
/// `expected_dim` values when a dimension is given. An empty blob decodes
/// to an empty vector, which records treat as a missing embedding.
pub fn decode_embedding(blob: &[u8], expected_dim: Option<usize>) -> Result<Vector> {
    if blob.len() % F32_BYTES != 0 {
        return Err(Error::DimensionMismatch {
            context: "embedding blob length in bytes".to_string(),
            expected: blob.len().next_multiple_of(F32_BYTES),
            actual: blob.len(),
        });
    }

    let dim = blob.len() / F32_BYTES;
    if let Some(expected) = expected_dim {
        if dim != 0 && dim != expected {
            return Err(Error::DimensionMismatch {
                context: "embedding blob".to_string(),
                expected,
                actual: dim,
            });
        }
    }

    let mut buf = blob;
    let mut data = Vec::with_capacity(dim);
    while buf.has_remaining() {
        data.push(buf.get_f32_le());
    }

    let vector = Vector::new(data);
    if !vector.is_finite() {
        return Err(Error::InvalidRecord(
            "embedding blob contains non-finite values".to_string(),
        ));
    }
    Ok(vector)
}

pub fn encode_embedding(vector: &Vector) -> Bytes {
    let mut buf = BytesMut::with_capacity(vector.dim() * F32_BYTES);
    for value in vector.as_slice() {
        buf.put_f32_le(*value);
    }
    buf.freeze()
}
