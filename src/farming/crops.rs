//! Crop planting and growth-phase management.

use bevy::prelude::*;
use crate::shared::*;
use super::crop_can_grow_in_season;

// ─────────────────────────────────────────────────────────────────────────────
// Planting
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantOutcome {
    Planted,
    NotSoil,
    Occupied,
    UnknownCrop,
    OutOfSeason,
}

/// Plants `crop_id` at `pos`. The tile must be soil without a crop, and the
/// crop must be native to `season`.
pub fn plant_crop(
    farm_state: &mut FarmState,
    crop_registry: &CropRegistry,
    pos: TilePos,
    crop_id: &str,
    season: Season,
) -> PlantOutcome {
    let Some(def) = crop_registry.crops.get(crop_id) else {
        return PlantOutcome::UnknownCrop;
    };
    if !crop_can_grow_in_season(def, season) {
        return PlantOutcome::OutOfSeason;
    }
    let Some(TerrainFeature::Soil(soil)) = farm_state.features.get_mut(&pos) else {
        return PlantOutcome::NotSoil;
    };
    if soil.crop.is_some() {
        return PlantOutcome::Occupied;
    }

    soil.crop = Some(CropTile::seeded(def));
    PlantOutcome::Planted
}

/// Listen for PlantSeedEvent and actually plant the crop.
pub fn handle_plant_seed(
    mut plant_events: EventReader<PlantSeedEvent>,
    mut farm_state: ResMut<FarmState>,
    crop_registry: Res<CropRegistry>,
    calendar: Res<Calendar>,
) {
    for event in plant_events.read() {
        let pos = (event.grid_x, event.grid_y);
        let outcome = plant_crop(
            &mut farm_state,
            &crop_registry,
            pos,
            &event.crop_id,
            calendar.season(),
        );
        if outcome != PlantOutcome::Planted {
            debug!("[Farm] Could not plant {} at {:?}: {:?}", event.crop_id, pos, outcome);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nightly update
// ─────────────────────────────────────────────────────────────────────────────

/// What one night did to the farm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NightlyGrowth {
    pub grew: usize,
    /// Crops the farm itself killed for being out of season.
    pub decayed: usize,
}

/// Advance all living crops by one day on `season`.
///
/// Unless the farm is exempt, a crop not native to `season` dies instead of
/// growing. A fully grown crop only counts its regrow timer down.
pub fn advance_crop_growth(farm_state: &mut FarmState, season: Season) -> NightlyGrowth {
    let exempt = farm_state.exempt_from_seasonal_decay;
    let mut growth = NightlyGrowth::default();

    for feature in farm_state.features.values_mut() {
        let Some(crop) = feature.crop_mut() else {
            continue;
        };
        if crop.dead {
            continue;
        }

        if !exempt && !crop.is_native_to(season) {
            crop.kill();
            growth.decayed += 1;
            continue;
        }

        if crop.fully_grown {
            if crop.day_of_current_phase > 0 {
                crop.day_of_current_phase -= 1;
            }
            growth.grew += 1;
            continue;
        }

        if let Some(&days_needed) = crop.phase_days.get(crop.current_phase as usize) {
            crop.day_of_current_phase += 1;
            if crop.day_of_current_phase >= days_needed as i32 {
                crop.current_phase += 1;
                crop.day_of_current_phase = 0;
            }
            growth.grew += 1;
        }
    }

    growth
}

pub fn on_new_day(mut new_day: EventReader<NewDayEvent>, mut farm_state: ResMut<FarmState>) {
    for event in new_day.read() {
        let exempt = farm_state.exempt_from_seasonal_decay;
        let growth = advance_crop_growth(&mut farm_state, event.date.season());
        info!(
            "[Farm] Night into {}: {} crops grew, {} lost to the season{}",
            event.date,
            growth.grew,
            growth.decayed,
            if exempt { " (decay suspended)" } else { "" }
        );
    }
}
