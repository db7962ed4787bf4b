/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Radial placement of newly discovered words around their parent.
//!
//! Screen coordinates: y grows downward, so angle `-π/2` is due north and
//! increasing angles run clockwise.

use std::f32::consts::{PI, TAU};

use euclid::default::{Point2D, Vector2D};

pub const DEFAULT_RADIUS: f32 = 200.0;

/// Evenly spaces `total` children on a circle around the parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialLayout {
    pub radius: f32,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
        }
    }
}

impl RadialLayout {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Position of child `index` out of `total`. `total == 0` counts as one.
    pub fn place(&self, parent: Point2D<f32>, index: usize, total: usize) -> Point2D<f32> {
        let total = total.max(1) as f32;
        let angle = TAU * index as f32 / total - PI / 2.0;
        parent + Vector2D::new(angle.cos(), angle.sin()) * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: Point2D<f32>, expected: (f32, f32)) {
        assert!(
            (actual.x - expected.0).abs() < 1e-3 && (actual.y - expected.1).abs() < 1e-3,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[rstest]
    #[case(0, 4, (0.0, -200.0))]
    #[case(1, 4, (200.0, 0.0))]
    #[case(2, 4, (0.0, 200.0))]
    #[case(3, 4, (-200.0, 0.0))]
    #[case(0, 1, (0.0, -200.0))]
    #[case(1, 2, (0.0, 200.0))]
    fn places_clockwise_from_north(
        #[case] index: usize,
        #[case] total: usize,
        #[case] expected: (f32, f32),
    ) {
        let layout = RadialLayout::default();
        assert_close(layout.place(Point2D::origin(), index, total), expected);
    }

    #[test]
    fn zero_total_behaves_like_one() {
        let layout = RadialLayout::default();
        assert_eq!(
            layout.place(Point2D::origin(), 0, 0),
            layout.place(Point2D::origin(), 0, 1)
        );
    }

    #[test]
    fn offsets_are_relative_to_parent() {
        let layout = RadialLayout::new(50.0);
        assert_close(layout.place(Point2D::new(100.0, 100.0), 0, 2), (100.0, 50.0));
        assert_close(layout.place(Point2D::new(100.0, 100.0), 1, 2), (100.0, 150.0));
    }
}
