//! Data layer: populates the crop registry at startup.
//!
//! This plugin runs in OnEnter(GameState::Loading), fills the CropRegistry
//! from the hard-coded definitions in `crops`, then moves the game into
//! GameState::Playing.

pub mod crops;

use bevy::prelude::*;
use crate::shared::*;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Loading), load_all_data);
    }
}

fn load_all_data(
    mut crop_registry: ResMut<CropRegistry>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    crops::populate_crops(&mut crop_registry);
    info!("[Data] Crops loaded: {}", crop_registry.crops.len());

    next_state.set(GameState::Playing);
}
