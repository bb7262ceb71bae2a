//! Grace domain: keeps out-of-season crops alive for a configurable number
//! of days after their season ends.
//!
//! The rules themselves (`policy`, `inspector`, `controller`) only see the
//! farm through the traits in `host`. This module implements those traits
//! for the shared [`FarmState`] and hooks the controller into the nightly
//! [`DayCycleSet`] phases:
//!
//! - `DayStarted`: rebuild the watch set of ripe, regrowing, out-of-season crops
//! - `DayEnding`: decide tomorrow's deaths, exempting the farm from its own decay
//! - `BeforeSave`: clear the exemption flag so it never reaches a save file

pub mod controller;
pub mod host;
pub mod inspector;
pub mod policy;

use bevy::prelude::*;

use crate::config::GraceDurations;
use crate::shared::*;
use controller::{DayEndReport, DayTransitionController};
use host::{HostCrop, HostFarm};
use policy::GracePolicy;

/// The controller for the shared farm, keyed by tile position.
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct GraceController(pub DayTransitionController<TilePos>);

/// Most recent evening decision, for summaries and tests.
#[derive(Resource, Debug, Default)]
pub struct GraceLog {
    pub last_report: Option<DayEndReport>,
    pub nights_evaluated: u32,
}

pub struct GracePlugin {
    pub durations: GraceDurations,
}

impl Plugin for GracePlugin {
    fn build(&self, app: &mut App) {
        let policy = GracePolicy::new(self.durations);
        app.insert_resource(GraceController(DayTransitionController::new(policy)))
            .init_resource::<GraceLog>()
            .add_systems(
                Update,
                on_day_ending
                    .in_set(DayCycleSet::DayEnding)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                on_before_save
                    .in_set(DayCycleSet::BeforeSave)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                on_day_started
                    .in_set(DayCycleSet::DayStarted)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host adapters
// ─────────────────────────────────────────────────────────────────────────────

impl HostCrop for CropTile {
    fn regrow_after_harvest(&self) -> i32 {
        self.regrow_after_harvest
    }

    fn native_seasons(&self) -> &[Season] {
        &self.native_seasons
    }

    fn current_phase(&self) -> u32 {
        self.current_phase
    }

    fn total_phases(&self) -> u32 {
        CropTile::total_phases(self)
    }

    fn fully_grown(&self) -> bool {
        self.fully_grown
    }

    fn day_of_current_phase(&self) -> i32 {
        self.day_of_current_phase
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn kill(&mut self) {
        CropTile::kill(self);
    }
}

impl HostFarm for FarmState {
    type TileKey = TilePos;
    type Crop = CropTile;

    fn tile_keys(&self) -> Vec<TilePos> {
        self.positions()
    }

    fn crop(&self, key: TilePos) -> Option<&CropTile> {
        self.crop_at(key)
    }

    fn crop_mut(&mut self, key: TilePos) -> Option<&mut CropTile> {
        self.crop_at_mut(key)
    }

    fn exempt_from_seasonal_decay(&self) -> bool {
        self.exempt_from_seasonal_decay
    }

    fn set_exempt_from_seasonal_decay(&mut self, exempt: bool) {
        self.exempt_from_seasonal_decay = exempt;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle systems
// ─────────────────────────────────────────────────────────────────────────────

pub fn on_day_started(
    mut started: EventReader<DayStartedEvent>,
    calendar: Res<Calendar>,
    farm_state: Res<FarmState>,
    mut controller: ResMut<GraceController>,
) {
    if started.read().count() == 0 {
        return;
    }

    let watched = controller.on_day_started(&*farm_state, calendar.season());
    debug!(
        "[Grace] {}: watching {} ripe out-of-season crops",
        calendar.today(),
        watched
    );
}

pub fn on_day_ending(
    mut ending: EventReader<DayEndingEvent>,
    calendar: Res<Calendar>,
    mut farm_state: ResMut<FarmState>,
    mut controller: ResMut<GraceController>,
    mut grace_log: ResMut<GraceLog>,
) {
    if ending.read().count() == 0 {
        return;
    }

    let report = controller.on_day_ending(&mut *farm_state, calendar.today());
    if report.grace_active {
        info!(
            "[Grace] Grace open for {}: {} crops past grace, {} after their bonus harvest",
            report.next_date, report.killed_out_of_grace, report.killed_after_bonus_harvest
        );
    } else {
        info!(
            "[Grace] No grace open for {}: seasonal decay left to the farm",
            report.next_date
        );
    }

    grace_log.last_report = Some(report);
    grace_log.nights_evaluated += 1;
}

pub fn on_before_save(
    mut before_save: EventReader<BeforeSaveEvent>,
    mut farm_state: ResMut<FarmState>,
    mut controller: ResMut<GraceController>,
) {
    if before_save.read().count() == 0 {
        return;
    }

    if controller.on_before_save(&mut *farm_state) {
        debug!("[Grace] Cleared seasonal-decay exemption before save");
    }
}
