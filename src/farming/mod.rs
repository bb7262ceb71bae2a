//! Farming domain, the host farm: planting, nightly growth, harvest, and the
//! farm's own out-of-season decay.
//!
//! Communicates with other domains exclusively through crate::shared events/resources.
//! The grace rules switch the decay off for a night through
//! `FarmState::exempt_from_seasonal_decay`; everything else here runs as is.

use bevy::prelude::*;
use crate::shared::*;

pub mod crops;
pub mod harvest;

pub struct FarmingPlugin;

impl Plugin for FarmingPlugin {
    fn build(&self, app: &mut App) {
        app
            // ------------------------------------------------------------------
            // Player actions during the day
            // ------------------------------------------------------------------
            .add_systems(
                Update,
                (
                    crops::handle_plant_seed,
                    harvest::handle_harvest,
                )
                    .in_set(DayCycleSet::Daytime)
                    .run_if(in_state(GameState::Playing)),
            )
            // ------------------------------------------------------------------
            // Overnight growth & decay for the new date
            // ------------------------------------------------------------------
            .add_systems(
                Update,
                crops::on_new_day
                    .in_set(DayCycleSet::NightlyUpdate)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers used across submodules
// ─────────────────────────────────────────────────────────────────────────────

/// Check whether the given CropDef can grow in this season.
pub fn crop_can_grow_in_season(def: &CropDef, season: Season) -> bool {
    def.seasons.contains(&season)
}

/// Turns every position in the rectangle into empty soil, leaving tiles that
/// already are soil alone.
pub fn till_area(farm_state: &mut FarmState, min: TilePos, max: TilePos) {
    for x in min.0..=max.0 {
        for y in min.1..=max.1 {
            let feature = farm_state
                .features
                .entry((x, y))
                .or_insert_with(|| TerrainFeature::Soil(SoilTile::default()));
            if !matches!(feature, TerrainFeature::Soil(_)) {
                *feature = TerrainFeature::Soil(SoilTile::default());
            }
        }
    }
}
