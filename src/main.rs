use std::path::PathBuf;
use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seasongrace::calendar::CalendarPlugin;
use seasongrace::config::{load_grace_config, DEFAULT_CONFIG_PATH};
use seasongrace::data::DataPlugin;
use seasongrace::farming::{till_area, FarmingPlugin};
use seasongrace::grace::inspector::is_harvestable;
use seasongrace::grace::{GraceLog, GracePlugin};
use seasongrace::save::{read_save, SavePlugin, SaveSettings};
use seasongrace::shared::*;

/// Headless farm simulation: plants a Spring farm and sleeps through the
/// nights, logging which crops the grace rules keep alive.
#[derive(Parser, Debug)]
#[command(name = "seasongrace", version)]
struct Cli {
    /// Grace config (RON). A missing file means 28 days for every season.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Nights to simulate.
    #[arg(long, default_value_t = 56)]
    days: u32,

    /// Seed for planting and harvesting choices.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Side length of the planted square.
    #[arg(long, default_value_t = 6)]
    plots: i32,

    /// Chance that a ripe crop gets picked on any given day.
    #[arg(long, default_value_t = 0.5, value_parser = parse_probability)]
    harvest_chance: f64,

    /// Write a save file here every night.
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Continue from the save in --save-dir instead of planting a new farm.
    #[arg(long, requires = "save_dir")]
    resume: bool,

    /// Log filter, e.g. "info" or "seasongrace=debug".
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("not a number: {}", e))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{} is not between 0 and 1", p))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        LogPlugin {
            filter: cli.log_filter.clone(),
            ..default()
        },
        StatesPlugin,
    ));

    let durations = match load_grace_config(&cli.config) {
        Ok(durations) => durations,
        Err(e) => {
            error!("[Config] {}", e);
            return ExitCode::FAILURE;
        }
    };

    app
        // Shared resources, events, day-cycle ordering
        .add_plugins(SharedPlugin)
        // Domain plugins
        .add_plugins(CalendarPlugin)
        .add_plugins(FarmingPlugin)
        .add_plugins(GracePlugin { durations })
        .add_plugins(SavePlugin)
        // Data loading
        .add_plugins(DataPlugin)
        .insert_resource(SaveSettings {
            directory: cli.save_dir.clone(),
        })
        .init_resource::<FailedSaves>()
        .add_systems(Update, count_failed_saves.in_set(DayCycleSet::DayStarted));

    let mut rng = StdRng::seed_from_u64(cli.seed);

    let resumed = match (&cli.save_dir, cli.resume) {
        (Some(dir), true) => match read_save(dir) {
            Ok(data) => {
                let (calendar, farm_state) = data.restore();
                info!("[Sim] Resuming from {}", calendar.today());
                app.insert_resource(calendar).insert_resource(farm_state);
                true
            }
            Err(e) => {
                error!("[Save] {}", e);
                return ExitCode::FAILURE;
            }
        },
        _ => {
            app.insert_resource(prepare_field(cli.plots));
            false
        }
    };

    // Loading → Playing, then the first morning.
    app.update();
    app.update();

    if !resumed {
        sow_spring_crops(&mut app, &mut rng);
    }

    for _ in 0..cli.days {
        pick_ripe_crops(&mut app, cli.harvest_chance, &mut rng);
        app.world_mut().send_event(SleepEvent);
        app.update();
        log_survivors(&app);
    }

    let failed = app.world().resource::<FailedSaves>().0;
    if failed > 0 {
        error!("[Sim] {} nightly saves failed", failed);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[derive(Resource, Default)]
struct FailedSaves(u32);

fn count_failed_saves(mut complete: EventReader<SaveCompleteEvent>, mut failed: ResMut<FailedSaves>) {
    for event in complete.read() {
        if !event.success {
            failed.0 += 1;
        }
    }
}

/// A tilled square with a strip of grass along its lower edge.
fn prepare_field(plots: i32) -> FarmState {
    let mut farm_state = FarmState::default();
    let max = plots.max(1) - 1;
    till_area(&mut farm_state, (0, 0), (max, max));
    for x in 0..=max {
        farm_state.features.insert((x, -1), TerrainFeature::Grass);
    }
    farm_state
}

/// Seeds every empty soil tile with a random Spring crop. The seeds go in
/// during the first day, before the first night.
fn sow_spring_crops(app: &mut App, rng: &mut StdRng) {
    let mut spring_crops: Vec<ItemId> = app
        .world()
        .resource::<CropRegistry>()
        .crops
        .values()
        .filter(|def| def.seasons.contains(&Season::Spring))
        .map(|def| def.id.clone())
        .collect();
    spring_crops.sort_unstable();
    if spring_crops.is_empty() {
        warn!("[Sim] No Spring crops in the registry, nothing to sow");
        return;
    }

    let empty_soil: Vec<TilePos> = {
        let farm_state = app.world().resource::<FarmState>();
        farm_state
            .positions()
            .into_iter()
            .filter(|pos| {
                matches!(
                    farm_state.features.get(pos),
                    Some(TerrainFeature::Soil(SoilTile { crop: None }))
                )
            })
            .collect()
    };

    for (grid_x, grid_y) in empty_soil {
        let crop_id = spring_crops[rng.gen_range(0..spring_crops.len())].clone();
        app.world_mut().send_event(PlantSeedEvent { grid_x, grid_y, crop_id });
    }
}

fn pick_ripe_crops(app: &mut App, chance: f64, rng: &mut StdRng) {
    let ripe: Vec<TilePos> = {
        let farm_state = app.world().resource::<FarmState>();
        farm_state
            .positions()
            .into_iter()
            .filter(|&pos| {
                farm_state
                    .crop_at(pos)
                    .is_some_and(|crop| !crop.dead && is_harvestable(crop))
            })
            .collect()
    };

    for (grid_x, grid_y) in ripe {
        if rng.gen_bool(chance) {
            app.world_mut().send_event(HarvestEvent { grid_x, grid_y });
        }
    }
}

fn log_survivors(app: &App) {
    let calendar = app.world().resource::<Calendar>();
    let farm_state = app.world().resource::<FarmState>();
    let grace_log = app.world().resource::<GraceLog>();

    let (alive, dead) = farm_state
        .features
        .values()
        .filter_map(TerrainFeature::crop)
        .fold((0, 0), |(alive, dead), crop| {
            if crop.dead {
                (alive, dead + 1)
            } else {
                (alive + 1, dead)
            }
        });

    let grace = match grace_log.last_report {
        Some(report) if report.grace_active => "grace open",
        Some(_) => "no grace",
        None => "not evaluated",
    };
    info!(
        "[Sim] {}: {} crops alive, {} withered ({})",
        calendar.today(),
        alive,
        dead,
        grace
    );
}
