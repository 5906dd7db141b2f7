//! Q16.16 Fixed-Point Arena Coordinates
//!
//! The catch stage moves items by fractional pixels per frame. Positions
//! and speeds are kept as integers so a seeded round replays exactly.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── pixels ────┘└──── 1/65536 px ───┘                │
//! │   └─ Sign bit (items spawn above the arena, y < 0)          │
//! │                                                             │
//! │  Range: -32768 px to +32767 px                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Number of fractional bits.
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (one pixel).
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// Convert whole pixels to fixed-point.
#[inline]
pub const fn from_px(px: i32) -> Fixed {
    px << FIXED_SCALE
}

/// Whole pixels, rounded toward negative infinity.
#[inline]
pub const fn to_px(f: Fixed) -> i32 {
    f >> FIXED_SCALE
}

/// Convert fixed-point to float for rendering only.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_conversion() {
        assert_eq!(from_px(1), FIXED_ONE);
        assert_eq!(to_px(from_px(480)), 480);
        assert_eq!(to_px(from_px(-26)), -26);
        assert_eq!(to_px(FIXED_ONE + FIXED_ONE / 2), 1);
    }

    #[test]
    fn test_negative_floor() {
        assert_eq!(to_px(-FIXED_ONE / 2), -1);
    }

    #[test]
    fn test_float_for_rendering() {
        assert!((to_float(FIXED_ONE * 5 / 2) - 2.5).abs() < 0.0001);
    }
}
