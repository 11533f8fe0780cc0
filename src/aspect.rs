use crate::error::{ReccamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete target aspect ratios for preview and capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    Ratio4x3,
    Ratio16x9,
}

impl AspectRatio {
    /// Pick the ratio closest to `max(width, height) / min(width, height)`.
    ///
    /// Ties resolve to 4:3. Both dimensions must be non-zero.
    pub fn select(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReccamError::InvalidDimensions { width, height });
        }

        let long = u64::from(width.max(height));
        let short = u64::from(width.min(height));

        // |long/short - 4/3| vs |long/short - 16/9|, both scaled by 9 * short
        let to_4x3 = (9 * long).abs_diff(12 * short);
        let to_16x9 = (9 * long).abs_diff(16 * short);

        if to_4x3 <= to_16x9 {
            Ok(AspectRatio::Ratio4x3)
        } else {
            Ok(AspectRatio::Ratio16x9)
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Ratio4x3 => write!(f, "4:3"),
            AspectRatio::Ratio16x9 => write!(f, "16:9"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ratios() {
        assert_eq!(AspectRatio::select(1000, 750).unwrap(), AspectRatio::Ratio4x3);
        assert_eq!(AspectRatio::select(1920, 1080).unwrap(), AspectRatio::Ratio16x9);
    }

    #[test]
    fn test_orientation_does_not_matter() {
        assert_eq!(AspectRatio::select(750, 1000).unwrap(), AspectRatio::Ratio4x3);
        assert_eq!(AspectRatio::select(1080, 1920).unwrap(), AspectRatio::Ratio16x9);
    }

    #[test]
    fn test_midpoint_resolves_to_4x3() {
        // 1400 / 900 = 14/9, exactly halfway between 4/3 and 16/9
        assert_eq!(AspectRatio::select(1400, 900).unwrap(), AspectRatio::Ratio4x3);
        assert_eq!(AspectRatio::select(1401, 900).unwrap(), AspectRatio::Ratio16x9);
    }

    #[test]
    fn test_square_and_extreme() {
        assert_eq!(AspectRatio::select(500, 500).unwrap(), AspectRatio::Ratio4x3);
        assert_eq!(AspectRatio::select(3000, 1000).unwrap(), AspectRatio::Ratio16x9);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            AspectRatio::select(0, 1080),
            Err(ReccamError::InvalidDimensions { width: 0, height: 1080 })
        ));
        assert!(AspectRatio::select(1920, 0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(AspectRatio::Ratio4x3.to_string(), "4:3");
        assert_eq!(AspectRatio::Ratio16x9.to_string(), "16:9");
    }
}
