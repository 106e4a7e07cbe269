//! Position ↔ raster index mapping.
//!
//! Positions are mixed-radix numbers over the axis lengths with axis 0
//! varying fastest:
//!
//! ```text
//! raster = pos[0] + len[0] * (pos[1] + len[1] * (pos[2] + ...))
//! ```
//!
//! The same encoding is used by strategies, cache storage and sources.

use crate::error::{CacheError, Result};

/// Integer coordinate, one component per axis.
pub type Position = Vec<usize>;

/// Total number of positions in the axis space.
///
/// Returns an error if any axis is empty or the product overflows `usize`.
pub fn raster_length(lengths: &[usize]) -> Result<usize> {
    if lengths.is_empty() {
        return Err(CacheError::InvalidConfiguration(
            "axis space must have at least one axis".into(),
        ));
    }
    lengths.iter().enumerate().try_fold(1usize, |acc, (axis, &len)| {
        if len == 0 {
            return Err(CacheError::InvalidConfiguration(format!(
                "axis {axis} has zero length"
            )));
        }
        acc.checked_mul(len).ok_or_else(|| {
            CacheError::InvalidConfiguration("axis space overflows usize".into())
        })
    })
}

/// Check that `pos` has one component per axis, each within bounds.
pub fn validate_position(lengths: &[usize], pos: &[usize]) -> Result<()> {
    if pos.len() != lengths.len() {
        return Err(CacheError::invalid_position(
            pos,
            format!("expected {} axes, got {}", lengths.len(), pos.len()),
        ));
    }
    for (axis, (&p, &len)) in pos.iter().zip(lengths).enumerate() {
        if p >= len {
            return Err(CacheError::invalid_position(
                pos,
                format!("axis {axis} value {p} not below length {len}"),
            ));
        }
    }
    Ok(())
}

/// Encode a position as its raster index.
pub fn position_to_raster(lengths: &[usize], pos: &[usize]) -> Result<usize> {
    validate_position(lengths, pos)?;
    Ok(pos
        .iter()
        .zip(lengths)
        .rev()
        .fold(0usize, |acc, (&p, &len)| acc * len + p))
}

/// Decode a raster index back into a position.
pub fn raster_to_position(lengths: &[usize], raster: usize) -> Result<Position> {
    let total = raster_length(lengths)?;
    if raster >= total {
        return Err(CacheError::InternalInconsistency {
            index: raster,
            capacity: total,
        });
    }
    let mut rest = raster;
    Ok(lengths
        .iter()
        .map(|&len| {
            let p = rest % len;
            rest /= len;
            p
        })
        .collect())
}

/// Apply a signed offset to a position, returning `None` when any component
/// leaves `[0, lengths[i])`.
pub fn offset_position(lengths: &[usize], pos: &[usize], offset: &[isize]) -> Option<Position> {
    pos.iter()
        .zip(offset)
        .zip(lengths)
        .map(|((&p, &d), &len)| {
            let moved = p.checked_add_signed(d)?;
            (moved < len).then_some(moved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_zero_is_fastest() {
        let lengths = [5, 7];
        assert_eq!(position_to_raster(&lengths, &[0, 0]).unwrap(), 0);
        assert_eq!(position_to_raster(&lengths, &[1, 0]).unwrap(), 1);
        assert_eq!(position_to_raster(&lengths, &[0, 1]).unwrap(), 5);
        assert_eq!(position_to_raster(&lengths, &[2, 3]).unwrap(), 17);
        assert_eq!(position_to_raster(&lengths, &[4, 6]).unwrap(), 34);
    }

    #[test]
    fn test_decode_known_index() {
        let lengths = [3, 4, 2];
        assert_eq!(raster_to_position(&lengths, 0).unwrap(), vec![0, 0, 0]);
        assert_eq!(raster_to_position(&lengths, 23).unwrap(), vec![2, 3, 1]);
        assert_eq!(raster_to_position(&lengths, 13).unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_rejects_bad_positions() {
        let lengths = [5, 7];
        assert!(matches!(
            position_to_raster(&lengths, &[1]),
            Err(CacheError::InvalidPosition { .. })
        ));
        assert!(matches!(
            position_to_raster(&lengths, &[5, 0]),
            Err(CacheError::InvalidPosition { .. })
        ));
        assert!(matches!(
            raster_to_position(&lengths, 35),
            Err(CacheError::InternalInconsistency { index: 35, capacity: 35 })
        ));
    }

    #[test]
    fn test_raster_length_rejects_empty_axes() {
        assert_eq!(raster_length(&[5, 7, 3]).unwrap(), 105);
        assert!(raster_length(&[]).is_err());
        assert!(raster_length(&[4, 0]).is_err());
        assert!(raster_length(&[usize::MAX, 2]).is_err());
    }

    #[test]
    fn test_offset_position_clips_at_bounds() {
        let lengths = [5, 7];
        assert_eq!(offset_position(&lengths, &[2, 3], &[1, -1]), Some(vec![3, 2]));
        assert_eq!(offset_position(&lengths, &[0, 3], &[-1, 0]), None);
        assert_eq!(offset_position(&lengths, &[4, 3], &[1, 0]), None);
        assert_eq!(offset_position(&lengths, &[2, 6], &[0, 1]), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn lengths_strategy() -> impl Strategy<Value = Vec<usize>> {
            prop::collection::vec(1usize..9, 1..5)
        }

        proptest! {
            #[test]
            fn test_position_roundtrip(
                (lengths, pos) in lengths_strategy().prop_flat_map(|lengths| {
                    let pos = lengths.iter().map(|&l| 0..l).collect::<Vec<_>>();
                    (Just(lengths), pos)
                })
            ) {
                let raster = position_to_raster(&lengths, &pos)?;
                prop_assert!(raster < raster_length(&lengths)?);
                prop_assert_eq!(raster_to_position(&lengths, raster)?, pos);
            }

            #[test]
            fn test_raster_roundtrip(
                (lengths, raster) in lengths_strategy().prop_flat_map(|lengths| {
                    let total: usize = lengths.iter().product();
                    (Just(lengths), 0..total)
                })
            ) {
                let pos = raster_to_position(&lengths, raster)?;
                prop_assert_eq!(position_to_raster(&lengths, &pos)?, raster);
            }
        }
    }
}
