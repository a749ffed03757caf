//! per-connection display colors.
//!
//! Every connection gets a random vivid color when it joins so each
//! participant's notes are visually distinct.  Saturation and value are kept
//! in the top fifth of their range so the colors read well on a dark
//! background.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl HsvColor {
    /// hue uniform in [0, 360), saturation and value uniform in [0.8, 1.0)
    pub fn random_vivid() -> HsvColor {
        let mut rng = rand::thread_rng();
        HsvColor {
            h: rng.gen::<f32>() * 360.0,
            s: 0.8 + rng.gen::<f32>() * 0.2,
            v: 0.8 + rng.gen::<f32>() * 0.2,
        }
    }

    /// CSS hsl() form of this color.  Renderers want hsl, the registry picks
    /// in hsv, so convert once here and let callers cache the string.
    pub fn to_css_hsl(&self) -> String {
        let l = self.v * (1.0 - self.s / 2.0);
        let s_hsl = if l <= 0.0 || l >= 1.0 {
            0.0
        } else {
            (self.v - l) / l.min(1.0 - l)
        };
        format!("hsl({:.0}, {:.0}%, {:.0}%)", self.h, s_hsl * 100.0, l * 100.0)
    }
}

impl fmt::Display for HsvColor {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ h: {:.0}, s: {:.2}, v: {:.2} }}", self.h, self.s, self.v)
    }
}

#[cfg(test)]
mod test_color {
    use super::*;

    #[test]
    fn random_vivid_ranges() {
        // colors must stay vivid so they stand out against black
        for _ in 0..100 {
            let c = HsvColor::random_vivid();
            assert!(c.h >= 0.0 && c.h < 360.0);
            assert!(c.s >= 0.8 && c.s < 1.0);
            assert!(c.v >= 0.8 && c.v < 1.0);
        }
    }
    #[test]
    fn css_form() {
        let c = HsvColor {
            h: 120.0,
            s: 1.0,
            v: 1.0,
        };
        // s=1 v=1 is pure green: hsl(120, 100%, 50%)
        assert_eq!(c.to_css_hsl(), "hsl(120, 100%, 50%)");
    }
    #[test]
    fn css_degenerate_lightness() {
        // v=0 collapses lightness to 0 and must not divide by zero
        let c = HsvColor {
            h: 0.0,
            s: 0.0,
            v: 0.0,
        };
        assert_eq!(c.to_css_hsl(), "hsl(0, 0%, 0%)");
    }
    #[test]
    fn serialize_round_trip() {
        let c = HsvColor {
            h: 210.5,
            s: 0.9,
            v: 0.85,
        };
        let j = serde_json::to_string(&c).unwrap();
        let back: HsvColor = serde_json::from_str(&j).unwrap();
        assert_eq!(back, c);
    }
}
