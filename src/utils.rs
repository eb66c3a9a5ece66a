//! This module provides a set of shared, low-level utility functions used
//! throughout the grainpipe Rust core.
//!
//! Its primary responsibilities include:
//! 1.  Providing safe, validated conversions between raw byte buffers and
//!     typed values.
//! 2.  Keeping any potentially dangerous casting behind one heavily audited seam.

use crate::error::GrainpipeError;

/// Decodes a byte buffer into an owned vector of primitive values.
///
/// This function is the primary gateway for converting raw bytes from the
/// persistence layer into workable, typed data. It copies element-wise, so it
/// tolerates payloads that are not aligned for `T` (artifact buffers carry no
/// alignment guarantee).
///
/// # Errors
/// Returns a `GrainpipeError::PodCast` if the buffer length is not a multiple
/// of `size_of::<T>()`.
pub fn bytes_to_typed_vec<T>(bytes: &[u8]) -> Result<Vec<T>, GrainpipeError>
where
    T: bytemuck::Pod,
{
    let size = std::mem::size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(GrainpipeError::PodCast(format!(
            "buffer of {} bytes is not a whole number of {}-byte elements",
            bytes.len(),
            size
        )));
    }
    Ok(bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

/// Converts a slice of primitive values into a `Vec<u8>`, respecting native
/// byte order. This performs a memory copy to create a new, owned byte vector.
pub fn typed_slice_to_bytes<T: bytemuck::Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_typed_vec_success() {
        let original_vec: Vec<i32> = vec![1, -2, 1_000_000];
        let bytes = typed_slice_to_bytes(&original_vec);
        assert_eq!(bytes_to_typed_vec::<i32>(&bytes).unwrap(), original_vec);
    }

    #[test]
    fn test_bytes_to_typed_vec_length_mismatch() {
        // 5 bytes is not divisible by size_of::<i32>(4).
        let bytes: Vec<u8> = vec![0, 1, 2, 3, 4];
        let result = bytes_to_typed_vec::<i32>(&bytes);
        assert!(matches!(result, Err(GrainpipeError::PodCast(_))));
    }

    #[test]
    fn test_bytes_to_typed_vec_tolerates_misalignment() {
        let original: Vec<f64> = vec![0.5, -1.25, 3.0];
        let mut padded = vec![0u8];
        padded.extend_from_slice(&typed_slice_to_bytes(&original));
        // Skipping the pad byte yields a slice that may sit on any alignment.
        assert_eq!(bytes_to_typed_vec::<f64>(&padded[1..]).unwrap(), original);
    }

    #[test]
    fn test_typed_slice_roundtrip_f32() {
        let original: Vec<f32> = vec![0.5, -1.25, 3.0];
        let bytes = typed_slice_to_bytes(&original);
        assert_eq!(bytes_to_typed_vec::<f32>(&bytes).unwrap(), original);
    }
}
