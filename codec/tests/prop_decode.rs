//! Property tests: decoded values match the delta recurrence, and hostile
//! bytes never panic.

use proptest::prelude::*;

use codec::{AttributeBuffer, DecodeLimits, Decoder};

const MAGIC: i32 = 0x787A_6300;

/// Builds a point-cloud stream with one scalar float attribute whose
/// residuals are the given sequential deltas.
fn scalar_point_cloud(deltas: &[i32]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&MAGIC.to_le_bytes());
    data.extend_from_slice(&1i32.to_le_bytes());
    data.push(0); // raw entropy
    data.extend_from_slice(&0i32.to_le_bytes()); // metadata
    data.extend_from_slice(&1i32.to_le_bytes()); // one attribute
    data.extend_from_slice(&7u16.to_le_bytes()); // "height" + NUL
    data.extend_from_slice(b"height\0");
    data.extend_from_slice(&1i32.to_le_bytes()); // generic codec
    data.extend_from_slice(&1.0f32.to_le_bytes());
    data.push(1); // one component
    data.push(6); // float
    data.push(0x2); // correlated
    data.extend_from_slice(&(deltas.len() as i32).to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes()); // point cloud
    data.extend_from_slice(&0u32.to_le_bytes()); // no groups

    // Bitstream section.
    let mut widths = Vec::with_capacity(deltas.len());
    let mut words: Vec<u32> = Vec::new();
    let mut partial = 0u64;
    let mut used = 0u32;
    for &delta in deltas {
        let mut width = 0u32;
        while width < 32 {
            let half = (1i64 << width) >> 1;
            if (delta == 0 && width == 0)
                || (width > 0 && i64::from(delta) >= -half && i64::from(delta) < half)
            {
                break;
            }
            width += 1;
        }
        widths.push(width as u8);
        if width > 0 {
            let raw = (i64::from(delta) + ((1i64 << width) >> 1)) as u64;
            partial = (partial << width) | raw;
            used += width;
            while used >= 32 {
                used -= 32;
                words.push((partial >> used) as u32);
            }
        }
    }
    if used > 0 {
        words.push((partial << (32 - used)) as u32);
    }
    data.extend_from_slice(&(words.len() as i32).to_le_bytes());
    while data.len() % 4 != 0 {
        data.push(0);
    }
    for word in words {
        data.extend_from_slice(&word.to_le_bytes());
    }

    // Width block, raw entropy.
    data.extend_from_slice(&(widths.len() as u32).to_le_bytes());
    data.extend_from_slice(&widths);
    data
}

proptest! {
    #[test]
    fn scalar_deltas_accumulate(deltas in prop::collection::vec(-1000i32..1000, 1..200)) {
        let data = scalar_point_cloud(&deltas);
        let geometry = codec::decode(&data).unwrap();
        let values = geometry
            .attribute("height")
            .and_then(AttributeBuffer::as_f32)
            .unwrap();
        prop_assert_eq!(values.len(), deltas.len());

        let mut sum = 0i64;
        for (value, &delta) in values.iter().zip(&deltas) {
            sum += i64::from(delta);
            prop_assert_eq!(*value, sum as f32);
        }
    }

    #[test]
    fn dictionary_construction_is_deterministic(
        pairs in prop::collection::vec((any::<u8>(), 1u8..=255), 2..16),
        compressed in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let a = codec::Tunstall::with_probabilities(pairs.clone());
        let b = codec::Tunstall::with_probabilities(pairs);
        let left = a.expand(&compressed, 64);
        let right = b.expand(&compressed, 64);
        prop_assert_eq!(&left, &right);
        if let Ok(out) = left {
            prop_assert_eq!(out.len(), 64);
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let decoder = Decoder::with_limits(
            wire::Limits::for_testing(),
            DecodeLimits::for_testing(),
        );
        let _ = decoder.decode(&bytes);
    }

    #[test]
    fn valid_header_with_corrupt_tail_never_panics(
        deltas in prop::collection::vec(-50i32..50, 1..32),
        cut in 0usize..64,
    ) {
        let mut data = scalar_point_cloud(&deltas);
        let keep = data.len().saturating_sub(cut);
        data.truncate(keep);
        let _ = codec::decode(&data);
    }
}
