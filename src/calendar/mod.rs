//! Calendar domain: the heartbeat of the farm.
//!
//! Responsible for:
//! - Turning the player's sleep into the day-ending notification
//! - Advancing the date by one day overnight and reporting season changes
//! - Announcing the start of each day (including the very first one)
//!
//! Date arithmetic itself lives on [`CalendarDate`] in `shared`; this module
//! only moves the host clock forward.

use bevy::prelude::*;

use crate::shared::*;

pub struct CalendarPlugin;

impl Plugin for CalendarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), announce_first_day)
            .add_systems(
                Update,
                begin_night
                    .in_set(DayCycleSet::Dusk)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                advance_date
                    .in_set(DayCycleSet::Overnight)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                announce_day_started
                    .in_set(DayCycleSet::Persist)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ─── Day boundaries ───────────────────────────────────────────────────────────

fn announce_first_day(calendar: Res<Calendar>, mut started: EventWriter<DayStartedEvent>) {
    info!("[Calendar] Farm opened on {}", calendar.today());
    started.send(DayStartedEvent);
}

/// Any number of sleep requests in one frame end the day exactly once.
fn begin_night(
    mut sleep_events: EventReader<SleepEvent>,
    calendar: Res<Calendar>,
    mut ending: EventWriter<DayEndingEvent>,
) {
    if sleep_events.read().count() == 0 {
        return;
    }

    info!("[Calendar] Day ending: {}", calendar.today());
    ending.send(DayEndingEvent);
}

/// Moves the clock to tomorrow. Runs after the grace rules have looked at
/// the ending day, and before the farm's own nightly update.
pub fn advance_date(
    mut ending: EventReader<DayEndingEvent>,
    mut calendar: ResMut<Calendar>,
    mut new_day: EventWriter<NewDayEvent>,
) {
    for _ in ending.read() {
        let old_season = calendar.season();
        calendar.date = calendar.date.add_days(1);

        if calendar.date == calendar.date.season_start_date() {
            info!(
                "[Calendar] Season changed: {:?} -> {:?} (Year {})",
                old_season,
                old_season.next(),
                calendar.date.year()
            );
        }

        new_day.send(NewDayEvent { date: calendar.date });
    }
}

fn announce_day_started(
    mut new_day: EventReader<NewDayEvent>,
    mut started: EventWriter<DayStartedEvent>,
) {
    for event in new_day.read() {
        info!("[Calendar] New day: {}", event.date);
        started.send(DayStartedEvent);
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
