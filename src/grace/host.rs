//! The narrow view of the host world the grace rules depend on.
//!
//! The farm owns every crop; the rules only read crop fields, call
//! [`HostCrop::kill`], and toggle the farm's seasonal-decay exemption.

use std::fmt::Debug;
use std::hash::Hash;

use crate::shared::Season;

/// Read access to a planted crop, plus the single action the rules take on it.
pub trait HostCrop {
    /// Days until the next harvest after picking, or -1 for single-harvest crops.
    fn regrow_after_harvest(&self) -> i32;
    fn native_seasons(&self) -> &[Season];
    fn current_phase(&self) -> u32;
    fn total_phases(&self) -> u32;
    fn fully_grown(&self) -> bool;
    fn day_of_current_phase(&self) -> i32;
    /// Dead crops stay on their tile until the host clears them.
    fn is_dead(&self) -> bool;
    /// Idempotent.
    fn kill(&mut self);
}

/// A farm: a grid of terrain features, some of which are soil holding a crop.
pub trait HostFarm {
    type TileKey: Copy + Eq + Hash + Debug;
    type Crop: HostCrop;

    /// Every tile carrying a terrain feature, crop or not.
    fn tile_keys(&self) -> Vec<Self::TileKey>;

    /// The crop planted at `key`, if that tile is soil with a crop.
    fn crop(&self, key: Self::TileKey) -> Option<&Self::Crop>;

    fn crop_mut(&mut self, key: Self::TileKey) -> Option<&mut Self::Crop>;

    fn exempt_from_seasonal_decay(&self) -> bool;

    fn set_exempt_from_seasonal_decay(&mut self, exempt: bool);
}
