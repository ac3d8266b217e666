//! # Environment Estimator
//!
//! Answers "what is this participant standing in / on?" by sampling the
//! block grid around a continuous position.
//!
//! ## Sampling pattern
//!
//! ```text
//!   top view               side view
//!   ┌───┬───┐
//!   │ c │ c │              ── position
//!   ├───P───┤                 │  vertical offset
//!   │ c │ c │              ── c c c c  (corners)
//!   └───┴───┘
//! ```
//!
//! Each predicate samples a primary block and then four diagonal corners
//! (`±h, v, ±h`) approximating the collision footprint. Unloaded or
//! out-of-world blocks count as air, so sampling never fails.

use warden_shared::Vec3;

use crate::host::{BlockInfo, WorldQuery};

/// Corner offsets around a position.
#[derive(Clone, Copy, Debug)]
struct Footprint {
    /// Horizontal half-width of the sampled square.
    horizontal: f64,
    /// Vertical offset applied to every corner.
    vertical: f64,
}

/// Distance below the feet for the primary ground sample.
const GROUND_DROP: f64 = 0.5;
/// Ground corners: player half-width, just below the feet.
const GROUND_FOOTPRINT: Footprint = Footprint {
    horizontal: 0.3,
    vertical: -0.1,
};
/// Ice corners: the block under the feet, at full player half-width so a
/// participant overhanging an ice edge still slides.
const ICE_FOOTPRINT: Footprint = Footprint {
    horizontal: 0.3,
    vertical: -0.5,
};
/// Liquid corners: same box as ground.
const LIQUID_FOOTPRINT: Footprint = Footprint {
    horizontal: 0.3,
    vertical: -0.1,
};
/// Climbable corners: narrow, slightly below the feet.
const CLIMBABLE_FOOTPRINT: Footprint = Footprint {
    horizontal: 0.1,
    vertical: -0.06,
};

/// Diagonal corner signs (x, z).
const CORNERS: [(f64, f64); 4] = [(1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, 1.0)];

/// Read-only view over a host world.
#[derive(Clone, Copy)]
pub struct Environment<'w> {
    world: &'w dyn WorldQuery,
}

impl<'w> Environment<'w> {
    /// Wraps a world query.
    #[must_use]
    pub fn new(world: &'w dyn WorldQuery) -> Self {
        Self { world }
    }

    /// Is there solid ground under `position`?
    #[must_use]
    pub fn is_grounded_at(&self, position: Vec3) -> bool {
        self.sample(position.offset(0.0, -GROUND_DROP, 0.0), |b| b.solid)
            || self.corners(position, GROUND_FOOTPRINT, |b| b.solid)
    }

    /// Is `position` standing on ice?
    #[must_use]
    pub fn is_on_ice_at(&self, position: Vec3) -> bool {
        let is_ice = |b: BlockInfo| b.ice;
        self.sample(position, is_ice)
            || self.sample_block_below(position, is_ice)
            || self.corners(position, ICE_FOOTPRINT, is_ice)
    }

    /// Is `position` in or standing on liquid?
    #[must_use]
    pub fn is_in_liquid_at(&self, position: Vec3) -> bool {
        let is_liquid = |b: BlockInfo| b.liquid;
        self.sample(position, is_liquid)
            || self.sample_block_below(position, is_liquid)
            || self.corners(position, LIQUID_FOOTPRINT, is_liquid)
    }

    /// Is there a climbable surface at `position`?
    #[must_use]
    pub fn has_climbable_at(&self, position: Vec3) -> bool {
        let is_climbable = |b: BlockInfo| b.climbable;
        self.sample(position, is_climbable)
            || self.corners(position, CLIMBABLE_FOOTPRINT, is_climbable)
    }

    /// Tests the block containing `position`; unloaded blocks fail the test.
    fn sample(&self, position: Vec3, test: impl Fn(BlockInfo) -> bool) -> bool {
        self.world.block(position.block()).is_some_and(test)
    }

    /// Tests the block directly below the one containing `position`.
    fn sample_block_below(&self, position: Vec3, test: impl Fn(BlockInfo) -> bool) -> bool {
        self.world.block(position.block().below()).is_some_and(test)
    }

    /// Tests the four diagonal corners of a footprint.
    fn corners(&self, position: Vec3, footprint: Footprint, test: impl Fn(BlockInfo) -> bool) -> bool {
        CORNERS.iter().any(|&(sx, sz)| {
            let corner = position.offset(
                sx * footprint.horizontal,
                footprint.vertical,
                sz * footprint.horizontal,
            );
            self.sample(corner, &test)
        })
    }
}
