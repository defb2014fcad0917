//! Unit conversions.
//!
//! Layout measurements are integers in twips (twentieths of a point);
//! 1440 twips = 72 points = 1 inch.

/// Twips per point.
pub const TWIPS_PER_POINT: i32 = 20;
/// Twips per inch.
pub const TWIPS_PER_INCH: i32 = 1440;
/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

pub fn pt_to_twip(pt: f64) -> i32 {
    (pt * TWIPS_PER_POINT as f64) as i32
}

pub fn twip_to_pt(twip: i32) -> f64 {
    twip as f64 / TWIPS_PER_POINT as f64
}

pub fn inch_to_pt(inch: f64) -> f64 {
    inch * POINTS_PER_INCH
}

pub fn pt_to_inch(pt: f64) -> f64 {
    pt / POINTS_PER_INCH
}

pub fn mm_to_inch(mm: f64) -> f64 {
    mm / 25.4
}

pub fn inch_to_mm(inch: f64) -> f64 {
    inch * 25.4
}

pub fn cm_to_inch(cm: f64) -> f64 {
    cm / 2.54
}

pub fn inch_to_cm(inch: f64) -> f64 {
    inch * 2.54
}

pub fn inch_to_twip(inch: f64) -> i32 {
    (inch * TWIPS_PER_INCH as f64) as i32
}

pub fn twip_to_inch(twip: i32) -> f64 {
    twip as f64 / TWIPS_PER_INCH as f64
}

/// Millimetres to twips, truncated like the other integer conversions.
pub fn mm_to_twip(mm: f64) -> i32 {
    inch_to_twip(mm_to_inch(mm))
}

/// Twips to whole millimetres, rounded to the nearest.
pub fn twip_to_mm(twip: i32) -> i32 {
    inch_to_mm(twip_to_inch(twip)).round() as i32
}

pub fn cm_to_twip(cm: f64) -> i32 {
    inch_to_twip(cm_to_inch(cm))
}

pub fn twip_to_cm(twip: i32) -> f64 {
    inch_to_cm(twip_to_inch(twip))
}

/// Standard paper sizes as (width, height) in twips, portrait.
pub mod paper {
    pub const A3: (i32, i32) = (16838, 23811);
    pub const A4: (i32, i32) = (11906, 16838);
    pub const A5: (i32, i32) = (8391, 11906);
    pub const LETTER: (i32, i32) = (12240, 15840);
    pub const LEGAL: (i32, i32) = (12240, 20160);
    pub const TABLOID: (i32, i32) = (15840, 24480);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_and_inch() {
        assert_eq!(pt_to_twip(12.0), 240);
        assert_eq!(twip_to_pt(240), 12.0);
        assert_eq!(inch_to_twip(1.0), 1440);
        assert_eq!(twip_to_inch(720), 0.5);
        assert_eq!(inch_to_pt(2.0), 144.0);
        assert_eq!(pt_to_inch(36.0), 0.5);
    }

    #[test]
    fn test_metric() {
        assert_eq!(cm_to_twip(2.54), 1440);
        assert_eq!(twip_to_mm(paper::A4.0), 210);
        assert_eq!(twip_to_mm(paper::A4.1), 297);
        assert!((twip_to_cm(1440) - 2.54).abs() < 1e-9);
        assert_eq!(mm_to_twip(25.4), 1440);
    }
}
