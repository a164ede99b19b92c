//! Strip geometry and hit testing
//!
//! Every strip has the same vertical bands, top to bottom:
//!
//! ```text
//! ┌──────┐ solo      7%
//! ├──────┤ mute      7%
//! │      │
//! │fader │ (rest)
//! │      │
//! ├──────┤ balance   3%
//! └──────┘ legend    8%
//! ```
//!
//! Chain strips sit left to right from x = 1; the master strip is pinned
//! one pixel from the right edge.

use crate::config::LayoutConfig;
use crate::strip::StripSlot;

/// Area of a strip under the pointer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Solo,
    Mute,
    Fader,
    Balance,
    Legend,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StripGeometry {
    screen_width: f32,
    strip_count: usize,
    strip_width: f32,
    button_height: f32,
    fader_top: f32,
    fader_bottom: f32,
    balance_bottom: f32,
    fader_width: f32,
}

impl StripGeometry {
    pub fn new(layout: &LayoutConfig) -> Self {
        let height = layout.screen_height as f32;
        let strip_width = layout.strip_width();
        let button_height = height * 0.07;
        let legend_height = height * 0.08;
        let balance_height = height * 0.03;
        let fader_bottom = height - legend_height - balance_height;
        // meters take two tenths of the strip plus padding
        let meter_width = (strip_width - 1.0) / 10.0;
        Self {
            screen_width: layout.screen_width as f32,
            strip_count: layout.strip_count(),
            strip_width,
            button_height,
            fader_top: 2.0 * button_height,
            fader_bottom,
            balance_bottom: fader_bottom + balance_height,
            fader_width: (strip_width - 1.0 - meter_width * 2.0 - 2.0).max(1.0),
        }
    }

    pub fn strip_width(&self) -> f32 {
        self.strip_width
    }

    /// Drag width for balance adjustment
    pub fn fader_width(&self) -> f32 {
        self.fader_width
    }

    /// Drag height for level adjustment
    pub fn fader_height(&self) -> f32 {
        self.fader_bottom - self.fader_top
    }

    /// Left edge of a slot
    pub fn strip_x(&self, slot: StripSlot) -> f32 {
        match slot {
            StripSlot::Visible(i) => 1.0 + self.strip_width * i as f32,
            StripSlot::Master => self.screen_width - self.strip_width - 1.0,
        }
    }

    fn slot_at(&self, x: f32) -> Option<StripSlot> {
        let master_x = self.strip_x(StripSlot::Master);
        if x >= master_x && x < master_x + self.strip_width {
            return Some(StripSlot::Master);
        }
        if x < 1.0 {
            return None;
        }
        let index = ((x - 1.0) / self.strip_width) as usize;
        (index < self.strip_count).then_some(StripSlot::Visible(index))
    }

    fn region_at(&self, y: f32) -> Option<Region> {
        if y < 0.0 {
            None
        } else if y < self.button_height {
            Some(Region::Solo)
        } else if y < self.fader_top {
            Some(Region::Mute)
        } else if y < self.fader_bottom {
            Some(Region::Fader)
        } else if y < self.balance_bottom {
            Some(Region::Balance)
        } else {
            Some(Region::Legend)
        }
    }

    /// Strip and region under a screen point
    pub fn hit(&self, x: f32, y: f32) -> Option<(StripSlot, Region)> {
        Some((self.slot_at(x)?, self.region_at(y)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> StripGeometry {
        StripGeometry::new(&LayoutConfig {
            visible_strips: 6,
            screen_width: 470,
            screen_height: 300,
        })
    }

    #[test]
    fn test_bands() {
        let g = geometry();
        // strip width (470 - 6) / 7 = 66.29
        let x = 10.0;
        assert_eq!(g.hit(x, 5.0), Some((StripSlot::Visible(0), Region::Solo)));
        assert_eq!(g.hit(x, 30.0), Some((StripSlot::Visible(0), Region::Mute)));
        assert_eq!(g.hit(x, 150.0), Some((StripSlot::Visible(0), Region::Fader)));
        assert_eq!(g.hit(x, 270.0), Some((StripSlot::Visible(0), Region::Balance)));
        assert_eq!(g.hit(x, 290.0), Some((StripSlot::Visible(0), Region::Legend)));
        assert!((g.fader_height() - 225.0).abs() < 0.01);
    }

    #[test]
    fn test_slots() {
        let g = geometry();
        assert_eq!(g.hit(70.0, 150.0).map(|h| h.0), Some(StripSlot::Visible(1)));
        assert_eq!(g.hit(380.0, 150.0).map(|h| h.0), Some(StripSlot::Visible(5)));
        assert_eq!(g.hit(465.0, 150.0).map(|h| h.0), Some(StripSlot::Master));
        assert_eq!(g.hit(0.5, 150.0), None);
    }
}
