//! Save domain: persists the farm once per night, after the grace rules
//! have cleared the seasonal-decay exemption.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;
pub const SAVE_FILE_NAME: &str = "farm.json";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("{action} failed for {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One terrain feature as written to disk. JSON object keys must be
/// strings, so the farm is stored as a list rather than a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTile {
    pub x: i32,
    pub y: i32,
    pub feature: TerrainFeature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub date: CalendarDate,
    pub exempt_from_seasonal_decay: bool,
    pub tiles: Vec<SavedTile>,
}

impl SaveData {
    pub fn capture(calendar: &Calendar, farm_state: &FarmState) -> Self {
        let tiles = farm_state
            .positions()
            .into_iter()
            .filter_map(|pos| {
                farm_state.features.get(&pos).map(|feature| SavedTile {
                    x: pos.0,
                    y: pos.1,
                    feature: feature.clone(),
                })
            })
            .collect();

        Self {
            version: SAVE_VERSION,
            date: calendar.today(),
            exempt_from_seasonal_decay: farm_state.exempt_from_seasonal_decay,
            tiles,
        }
    }

    pub fn restore(self) -> (Calendar, FarmState) {
        let features = self
            .tiles
            .into_iter()
            .map(|tile| ((tile.x, tile.y), tile.feature))
            .collect();
        let farm_state = FarmState {
            features,
            exempt_from_seasonal_decay: self.exempt_from_seasonal_decay,
        };
        (Calendar { date: self.date }, farm_state)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// Where nightly saves go. `None` keeps saves in memory only.
#[derive(Resource, Debug, Clone, Default)]
pub struct SaveSettings {
    pub directory: Option<PathBuf>,
}

/// The most recent snapshot, exactly as it was persisted.
#[derive(Resource, Debug, Clone, Default)]
pub struct LastSave {
    pub data: Option<SaveData>,
    pub saves_written: u32,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveSettings>()
            .init_resource::<LastSave>()
            .add_systems(
                Update,
                request_save
                    .in_set(DayCycleSet::NightlyUpdate)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                write_nightly_save
                    .in_set(DayCycleSet::Persist)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Every new day is saved; announce it so pre-save hooks can run first.
fn request_save(mut new_day: EventReader<NewDayEvent>, mut before_save: EventWriter<BeforeSaveEvent>) {
    for _ in new_day.read() {
        before_save.send(BeforeSaveEvent);
    }
}

fn write_nightly_save(
    mut before_save: EventReader<BeforeSaveEvent>,
    calendar: Res<Calendar>,
    farm_state: Res<FarmState>,
    settings: Res<SaveSettings>,
    mut last_save: ResMut<LastSave>,
    mut complete: EventWriter<SaveCompleteEvent>,
) {
    if before_save.read().count() == 0 {
        return;
    }

    let data = SaveData::capture(&calendar, &farm_state);
    if data.exempt_from_seasonal_decay {
        warn!("[Save] Seasonal-decay exemption still set while saving {}", data.date);
    }

    let result = match &settings.directory {
        Some(dir) => write_save(dir, &data),
        None => Ok(()),
    };

    match result {
        Ok(()) => {
            debug!("[Save] Saved {} ({} tiles)", data.date, data.tiles.len());
            complete.send(SaveCompleteEvent {
                date: data.date,
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            warn!("[Save] Save for {} failed: {}", data.date, e);
            complete.send(SaveCompleteEvent {
                date: data.date,
                success: false,
                error_message: Some(e.to_string()),
            });
        }
    }

    last_save.data = Some(data);
    last_save.saves_written += 1;
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

pub fn save_path(dir: &Path) -> PathBuf {
    dir.join(SAVE_FILE_NAME)
}

pub fn write_save(dir: &Path, data: &SaveData) -> Result<(), SaveError> {
    fs::create_dir_all(dir).map_err(|source| SaveError::Io {
        action: "create directory",
        path: dir.to_path_buf(),
        source,
    })?;

    let json = serde_json::to_string_pretty(data)?;

    let path = save_path(dir);
    // Write to a temp file first, then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).map_err(|source| SaveError::Io {
        action: "write",
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, &path).map_err(|source| SaveError::Io {
        action: "rename",
        path: path.clone(),
        source,
    })?;

    Ok(())
}

pub fn read_save(dir: &Path) -> Result<SaveData, SaveError> {
    let path = save_path(dir);
    let json = fs::read_to_string(&path).map_err(|source| SaveError::Io {
        action: "read",
        path: path.clone(),
        source,
    })?;
    let data: SaveData = serde_json::from_str(&json)?;

    // Version check: future versions can add migration here
    if data.version != SAVE_VERSION {
        warn!(
            "[Save] {} has version {} but current version is {}. Attempting to load anyway.",
            path.display(),
            data.version,
            SAVE_VERSION
        );
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_farm() -> FarmState {
        let mut farm = FarmState::default();
        farm.features.insert((0, 0), TerrainFeature::Tree);
        farm.features.insert(
            (1, 0),
            TerrainFeature::Soil(SoilTile {
                crop: Some(CropTile {
                    crop_id: "tomato".into(),
                    native_seasons: vec![Season::Summer],
                    phase_days: vec![1, 2],
                    regrow_after_harvest: 4,
                    current_phase: 2,
                    day_of_current_phase: 3,
                    fully_grown: true,
                    dead: false,
                }),
            }),
        );
        farm.features.insert((2, 0), TerrainFeature::Soil(SoilTile::default()));
        farm
    }

    #[test]
    fn test_capture_lists_tiles_in_position_order() {
        let calendar = Calendar { date: CalendarDate::from_parts(1, Season::Summer, 9) };
        let data = SaveData::capture(&calendar, &sample_farm());

        assert_eq!(data.version, SAVE_VERSION);
        assert_eq!(data.date, calendar.date);
        let positions: Vec<_> = data.tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(positions, vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_save_file_restores_the_farm() {
        let dir = std::env::temp_dir().join(format!("seasongrace-save-{}", std::process::id()));
        let calendar = Calendar { date: CalendarDate::from_parts(2, Season::Fall, 20) };
        let farm = sample_farm();

        write_save(&dir, &SaveData::capture(&calendar, &farm)).unwrap();
        let (loaded_calendar, loaded_farm) = read_save(&dir).unwrap().restore();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded_calendar, calendar);
        assert_eq!(loaded_farm, farm);
    }

    #[test]
    fn test_missing_save_is_an_io_error() {
        let dir = std::env::temp_dir().join("seasongrace-no-such-save-dir");
        assert!(matches!(read_save(&dir), Err(SaveError::Io { action: "read", .. })));
    }
}
