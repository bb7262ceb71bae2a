//! Harvest: the player picks ripe crops.

use bevy::prelude::*;
use crate::grace::inspector::is_harvestable;
use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Regrowing crop picked; it stays and starts its regrow timer.
    Regrowing,
    /// Single-harvest crop picked and removed.
    Removed,
    /// A withered crop was cleared away.
    ClearedDead,
}

/// Try to harvest the crop at `pos`. Returns `None` if nothing happened.
pub fn try_harvest_at(farm_state: &mut FarmState, pos: TilePos) -> Option<HarvestOutcome> {
    let TerrainFeature::Soil(soil) = farm_state.features.get_mut(&pos)? else {
        return None;
    };
    let crop = soil.crop.as_mut()?;

    if crop.dead {
        soil.crop = None;
        return Some(HarvestOutcome::ClearedDead);
    }

    if !is_harvestable(crop) {
        return None;
    }

    if crop.regrow_after_harvest > -1 {
        crop.fully_grown = true;
        crop.day_of_current_phase = crop.regrow_after_harvest;
        Some(HarvestOutcome::Regrowing)
    } else {
        soil.crop = None;
        Some(HarvestOutcome::Removed)
    }
}

pub fn handle_harvest(mut harvest_events: EventReader<HarvestEvent>, mut farm_state: ResMut<FarmState>) {
    for event in harvest_events.read() {
        let pos = (event.grid_x, event.grid_y);
        if let Some(outcome) = try_harvest_at(&mut farm_state, pos) {
            debug!("[Farm] Harvest at {:?}: {:?}", pos, outcome);
        }
    }
}
