//! Shared components, resources, events, and states for seasongrace.
//!
//! This is the type contract. Domain plugins talk to each other through the
//! events and resources defined here, and every system that takes part in the
//! nightly day cycle is placed in one of the [`DayCycleSet`] sets.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
}

// ═══════════════════════════════════════════════════════════════════════
// CALENDAR
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Fall,
            Season::Fall => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    /// Season for a (possibly large) season counter; wraps every 4.
    pub fn from_index(index: u32) -> Self {
        match index % SEASONS_PER_YEAR {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Fall,
            _ => Season::Winter,
        }
    }
}

/// A day on the fixed 4 × 28-day calendar.
///
/// Only the day count since the epoch is stored; season, day-of-season and
/// year are derived from it, so a date can never be internally inconsistent.
/// Day 1 is Spring 1 of year 1. Ordering follows the day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate {
    total_days: u32,
}

impl Default for CalendarDate {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl CalendarDate {
    pub const EPOCH: CalendarDate = CalendarDate { total_days: 1 };

    /// `n` days since the epoch, counting the epoch itself as day 1.
    /// Zero is clamped to the epoch.
    pub fn from_day_count(n: u32) -> Self {
        Self { total_days: n.max(1) }
    }

    /// Builds a date from its calendar parts. `day` is clamped into 1..=28
    /// and `year` to at least 1.
    pub fn from_parts(year: u32, season: Season, day: u8) -> Self {
        let day = u32::from(day.clamp(1, DAYS_PER_SEASON));
        let year = year.max(1);
        let season_instance = (year - 1) * SEASONS_PER_YEAR + season.index() as u32;
        Self::from_day_count(season_instance * DAYS_PER_SEASON_U32 + day)
    }

    pub fn total_days(self) -> u32 {
        self.total_days
    }

    pub fn season(self) -> Season {
        Season::from_index(self.season_instance())
    }

    /// 1..=28
    pub fn day_of_season(self) -> u8 {
        // Always < 28 before the +1, so the narrowing is lossless.
        ((self.total_days - 1) % DAYS_PER_SEASON_U32) as u8 + 1
    }

    pub fn year(self) -> u32 {
        self.season_instance() / SEASONS_PER_YEAR + 1
    }

    /// Zero-based count of seasons elapsed since the epoch. Every concrete
    /// occurrence of a season ("the Summer of year 2") has its own instance.
    pub fn season_instance(self) -> u32 {
        (self.total_days - 1) / DAYS_PER_SEASON_U32
    }

    /// Shifts the date by `delta` days in either direction, never going
    /// before the epoch.
    pub fn add_days(self, delta: i64) -> Self {
        let shifted = i64::from(self.total_days).saturating_add(delta);
        let clamped = shifted.clamp(1, i64::from(u32::MAX));
        Self::from_day_count(u32::try_from(clamped).unwrap_or(u32::MAX))
    }

    /// Last day of this date's season instance.
    pub fn season_end_date(self) -> Self {
        Self::season_instance_end(self.season_instance())
    }

    /// First day of this date's season instance.
    pub fn season_start_date(self) -> Self {
        Self::from_day_count(self.season_instance() * DAYS_PER_SEASON_U32 + 1)
    }

    /// Last day of the given zero-based season instance.
    pub fn season_instance_end(instance: u32) -> Self {
        Self::from_day_count(instance.saturating_add(1).saturating_mul(DAYS_PER_SEASON_U32))
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {} {:?} Year {}", self.day_of_season(), self.season(), self.year())
    }
}

/// The host's clock. Only the calendar domain advances it.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub date: CalendarDate,
}

impl Calendar {
    pub fn today(&self) -> CalendarDate {
        self.date
    }

    pub fn season(&self) -> Season {
        self.date.season()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FARMING
// ═══════════════════════════════════════════════════════════════════════

pub type ItemId = String;

/// Grid position of a terrain feature, (x, y).
pub type TilePos = (i32, i32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropDef {
    pub id: ItemId,
    pub name: String,
    pub seed_id: ItemId,
    pub seasons: Vec<Season>,
    /// Days spent in each growth phase before the final, harvestable one.
    pub phase_days: Vec<u32>,
    /// Days until the next harvest for regrowing crops, -1 for single harvest.
    pub regrow_after_harvest: i32,
}

/// A crop planted in soil. Owned by the farm; the grace rules only read it
/// and may kill it.
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropTile {
    pub crop_id: ItemId,
    pub native_seasons: Vec<Season>,
    pub phase_days: Vec<u32>,
    pub regrow_after_harvest: i32,
    pub current_phase: u32,
    pub day_of_current_phase: i32,
    pub fully_grown: bool,
    pub dead: bool,
}

impl CropTile {
    /// A freshly planted crop of the given definition.
    pub fn seeded(def: &CropDef) -> Self {
        Self {
            crop_id: def.id.clone(),
            native_seasons: def.seasons.clone(),
            phase_days: def.phase_days.clone(),
            regrow_after_harvest: def.regrow_after_harvest,
            current_phase: 0,
            day_of_current_phase: 0,
            fully_grown: false,
            dead: false,
        }
    }

    /// Growth phases including the final harvest phase.
    pub fn total_phases(&self) -> u32 {
        self.phase_days.len() as u32 + 1
    }

    pub fn is_native_to(&self, season: Season) -> bool {
        self.native_seasons.contains(&season)
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilTile {
    pub crop: Option<CropTile>,
}

/// Anything that can occupy a farm tile. Only soil can hold a crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainFeature {
    Soil(SoilTile),
    Tree,
    Grass,
    Stone,
}

impl TerrainFeature {
    pub fn crop(&self) -> Option<&CropTile> {
        match self {
            TerrainFeature::Soil(soil) => soil.crop.as_ref(),
            _ => None,
        }
    }

    pub fn crop_mut(&mut self) -> Option<&mut CropTile> {
        match self {
            TerrainFeature::Soil(soil) => soil.crop.as_mut(),
            _ => None,
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmState {
    pub features: HashMap<TilePos, TerrainFeature>,
    /// While set, the farm's own nightly update skips out-of-season decay.
    /// Must be false whenever the farm is persisted.
    pub exempt_from_seasonal_decay: bool,
}

impl FarmState {
    pub fn crop_at(&self, pos: TilePos) -> Option<&CropTile> {
        self.features.get(&pos).and_then(TerrainFeature::crop)
    }

    pub fn crop_at_mut(&mut self, pos: TilePos) -> Option<&mut CropTile> {
        self.features.get_mut(&pos).and_then(TerrainFeature::crop_mut)
    }

    /// Tile positions in a stable (sorted) order.
    pub fn positions(&self) -> Vec<TilePos> {
        let mut positions: Vec<TilePos> = self.features.keys().copied().collect();
        positions.sort_unstable();
        positions
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct CropRegistry {
    pub crops: HashMap<ItemId, CropDef>,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// The player goes to bed; starts the nightly cycle.
#[derive(Event, Debug, Clone, Default)]
pub struct SleepEvent;

/// The current day is ending. The calendar still shows that day.
#[derive(Event, Debug, Clone, Default)]
pub struct DayEndingEvent;

/// The calendar has advanced overnight.
#[derive(Event, Debug, Clone)]
pub struct NewDayEvent {
    pub date: CalendarDate,
}

/// The world is about to be persisted.
#[derive(Event, Debug, Clone, Default)]
pub struct BeforeSaveEvent;

/// A new day has started and the player is awake.
#[derive(Event, Debug, Clone, Default)]
pub struct DayStartedEvent;

#[derive(Event, Debug, Clone)]
pub struct HarvestEvent {
    pub grid_x: i32,
    pub grid_y: i32,
}

#[derive(Event, Debug, Clone)]
pub struct PlantSeedEvent {
    pub grid_x: i32,
    pub grid_y: i32,
    pub crop_id: ItemId,
}

/// Sent after every persistence attempt.
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub date: CalendarDate,
    pub success: bool,
    pub error_message: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// SCHEDULING: nightly ordering
// ═══════════════════════════════════════════════════════════════════════

/// Phases of the nightly cycle, chained in this order inside `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayCycleSet {
    /// Player actions during the day (harvest, planting).
    Daytime,
    /// Sleep is turned into the day-ending notification.
    Dusk,
    DayEnding,
    /// The calendar moves to tomorrow.
    Overnight,
    /// The farm's own update for the new date; the save is requested.
    NightlyUpdate,
    BeforeSave,
    Persist,
    DayStarted,
}

/// Registers the shared resources, events, state and the day-cycle ordering.
/// Expects `StatesPlugin` (or `DefaultPlugins`) to be present.
pub struct SharedPlugin;

impl Plugin for SharedPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<Calendar>()
            .init_resource::<FarmState>()
            .init_resource::<CropRegistry>()
            .add_event::<SleepEvent>()
            .add_event::<DayEndingEvent>()
            .add_event::<NewDayEvent>()
            .add_event::<BeforeSaveEvent>()
            .add_event::<DayStartedEvent>()
            .add_event::<HarvestEvent>()
            .add_event::<PlantSeedEvent>()
            .add_event::<SaveCompleteEvent>()
            .configure_sets(
                Update,
                (
                    DayCycleSet::Daytime,
                    DayCycleSet::Dusk,
                    DayCycleSet::DayEnding,
                    DayCycleSet::Overnight,
                    DayCycleSet::NightlyUpdate,
                    DayCycleSet::BeforeSave,
                    DayCycleSet::Persist,
                    DayCycleSet::DayStarted,
                )
                    .chain(),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const DAYS_PER_SEASON: u8 = 28;
pub const SEASONS_PER_YEAR: u32 = 4;
pub const DAYS_PER_SEASON_U32: u32 = DAYS_PER_SEASON as u32;

/// How many past season instances a grace lookup inspects.
pub const MAX_LOOKBACK_SEASONS: u32 = 3;

/// Grace durations at or above this many days never expire.
pub const PERMANENT_GRACE_DAYS: u32 = MAX_LOOKBACK_SEASONS * DAYS_PER_SEASON_U32;

// The longest finite grace must still end inside the lookback window.
const _: () =
    assert!((PERMANENT_GRACE_DAYS - 1).div_ceil(DAYS_PER_SEASON_U32) <= MAX_LOOKBACK_SEASONS);
