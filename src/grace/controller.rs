//! The per-day sequence: watch suspicious crops at dawn, decide deaths at
//! dusk, clear the exemption flag before every save.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use super::host::{HostCrop, HostFarm};
use super::inspector::{is_regrowing, is_suspicious, should_kill};
use super::policy::GracePolicy;
use crate::shared::{CalendarDate, Season};

/// A watched tile and the regrow state its crop had at dawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WatchedTile<K> {
    key: K,
    fully_grown_at_dawn: bool,
    day_of_phase_at_dawn: i32,
}

impl<K> WatchedTile<K> {
    fn observe<C: HostCrop>(key: K, crop: &C) -> Self {
        Self {
            key,
            fully_grown_at_dawn: crop.fully_grown(),
            day_of_phase_at_dawn: crop.day_of_current_phase(),
        }
    }

    /// Picking marks a crop fully grown and restarts its regrow timer;
    /// nothing else moves either during the day.
    fn was_picked<C: HostCrop>(&self, crop: &C) -> bool {
        crop.fully_grown()
            && (!self.fully_grown_at_dawn || crop.day_of_current_phase() > self.day_of_phase_at_dawn)
    }
}

/// Tiles whose crop was ripe, regrowing and out of season when the day
/// started. Rebuilt every morning, consumed every evening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSet<K> {
    tiles: Vec<WatchedTile<K>>,
}

impl<K> Default for WatchSet<K> {
    fn default() -> Self {
        Self { tiles: Vec::new() }
    }
}

impl<K: PartialEq> WatchSet<K> {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.tiles.iter().any(|watched| &watched.key == key)
    }
}

/// Outcome of one evening's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEndReport {
    /// The date the decisions were made for (tomorrow).
    pub next_date: CalendarDate,
    /// False means the host's own seasonal decay was left in charge.
    pub grace_active: bool,
    pub killed_out_of_grace: usize,
    pub killed_after_bonus_harvest: usize,
}

impl DayEndReport {
    pub fn total_killed(&self) -> usize {
        self.killed_out_of_grace + self.killed_after_bonus_harvest
    }
}

#[derive(Debug, Clone)]
pub struct DayTransitionController<K> {
    policy: GracePolicy,
    watch: WatchSet<K>,
}

impl<K> DayTransitionController<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new(policy: GracePolicy) -> Self {
        Self { policy, watch: WatchSet::default() }
    }

    pub fn watched(&self) -> &WatchSet<K> {
        &self.watch
    }

    /// Full rescan of the farm; replaces whatever was watched before.
    /// Returns how many crops are now watched.
    pub fn on_day_started<F>(&mut self, farm: &F, current_season: Season) -> usize
    where
        F: HostFarm<TileKey = K>,
    {
        let tiles = farm
            .tile_keys()
            .into_iter()
            .filter_map(|key| {
                farm.crop(key)
                    .filter(|crop| is_suspicious(*crop, current_season))
                    .map(|crop| WatchedTile::observe(key, crop))
            })
            .collect();
        self.watch = WatchSet { tiles };
        self.watch.len()
    }

    /// Evaluates tomorrow's survival while `today` is ending.
    ///
    /// When no grace window is open for tomorrow nothing is touched. Otherwise
    /// the farm is exempted from its own seasonal decay and this pass does the
    /// killing instead: every living crop [`should_kill`] condemns, plus every
    /// watched crop that was picked today. The watch set is emptied either way.
    pub fn on_day_ending<F>(&mut self, farm: &mut F, today: CalendarDate) -> DayEndReport
    where
        F: HostFarm<TileKey = K>,
    {
        let next_date = today.add_days(1);
        let watched = std::mem::take(&mut self.watch);

        let mut report = DayEndReport {
            next_date,
            grace_active: self.policy.any_grace_active(next_date),
            killed_out_of_grace: 0,
            killed_after_bonus_harvest: 0,
        };
        if !report.grace_active {
            return report;
        }

        farm.set_exempt_from_seasonal_decay(true);

        let condemned: HashSet<K> = farm
            .tile_keys()
            .into_iter()
            .filter(|&key| should_kill(farm.crop(key), next_date, &self.policy))
            .collect();
        for &key in &condemned {
            if let Some(crop) = farm.crop_mut(key) {
                crop.kill();
                report.killed_out_of_grace += 1;
            }
        }

        // One bonus harvest, then death.
        for watched_tile in watched.tiles {
            if condemned.contains(&watched_tile.key) {
                continue;
            }
            if let Some(crop) = farm.crop_mut(watched_tile.key) {
                if !crop.is_dead() && is_regrowing(crop) && watched_tile.was_picked(crop) {
                    crop.kill();
                    report.killed_after_bonus_harvest += 1;
                }
            }
        }

        report
    }

    /// Clears the exemption flag unconditionally. Returns whether it was set.
    pub fn on_before_save<F>(&mut self, farm: &mut F) -> bool
    where
        F: HostFarm<TileKey = K>,
    {
        let was_exempt = farm.exempt_from_seasonal_decay();
        farm.set_exempt_from_seasonal_decay(false);
        was_exempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraceDurations;
    use crate::shared::*;

    /// A farm of numbered tiles, nothing else.
    #[derive(Default)]
    struct FakeFarm {
        tiles: Vec<Option<CropTile>>,
        exempt: bool,
    }

    impl HostFarm for FakeFarm {
        type TileKey = usize;
        type Crop = CropTile;

        fn tile_keys(&self) -> Vec<usize> {
            (0..self.tiles.len()).collect()
        }

        fn crop(&self, key: usize) -> Option<&CropTile> {
            self.tiles.get(key).and_then(Option::as_ref)
        }

        fn crop_mut(&mut self, key: usize) -> Option<&mut CropTile> {
            self.tiles.get_mut(key).and_then(Option::as_mut)
        }

        fn exempt_from_seasonal_decay(&self) -> bool {
            self.exempt
        }

        fn set_exempt_from_seasonal_decay(&mut self, exempt: bool) {
            self.exempt = exempt;
        }
    }

    fn crop(seasons: &[Season], regrow: i32, ripe: bool) -> CropTile {
        let phase_days = vec![2, 2];
        CropTile {
            crop_id: "test_crop".into(),
            native_seasons: seasons.to_vec(),
            current_phase: if ripe { phase_days.len() as u32 } else { 0 },
            phase_days,
            regrow_after_harvest: regrow,
            day_of_current_phase: 0,
            fully_grown: false,
            dead: false,
        }
    }

    fn pick(crop: &mut CropTile) {
        crop.fully_grown = true;
        crop.day_of_current_phase = crop.regrow_after_harvest;
    }

    fn date(year: u32, season: Season, day: u8) -> CalendarDate {
        CalendarDate::from_parts(year, season, day)
    }

    fn controller(durations: GraceDurations) -> DayTransitionController<usize> {
        DayTransitionController::new(GracePolicy::new(durations))
    }

    #[test]
    fn test_day_start_watches_only_ripe_regrowing_out_of_season() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![
            Some(crop(&[Season::Spring], 4, true)),  // watched
            Some(crop(&[Season::Spring], 4, false)), // still growing
            Some(crop(&[Season::Spring], -1, true)), // single harvest
            Some(crop(&[Season::Summer], 4, true)),  // native
            None,
        ];

        let mut ctl = controller(GraceDurations::default());
        let watched = ctl.on_day_started(&farm, Season::Summer);

        assert_eq!(watched, 1);
        assert!(ctl.watched().contains(&0));
    }

    #[test]
    fn test_day_start_replaces_previous_watch_set() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(crop(&[Season::Spring], 4, true))];

        let mut ctl = controller(GraceDurations::default());
        ctl.on_day_started(&farm, Season::Summer);
        farm.tiles[0] = None;
        ctl.on_day_started(&farm, Season::Summer);

        assert!(ctl.watched().is_empty());
    }

    #[test]
    fn test_no_grace_leaves_farm_untouched() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(crop(&[Season::Spring], -1, false))];

        let mut ctl = controller(GraceDurations::none());
        let report = ctl.on_day_ending(&mut farm, date(1, Season::Spring, 28));

        assert!(!report.grace_active);
        assert!(!farm.exempt, "host decay stays in charge");
        assert_eq!(report.total_killed(), 0);
        assert!(!farm.tiles[0].as_ref().unwrap().dead);
    }

    #[test]
    fn test_grace_sets_exemption_and_kills_only_unprotected() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![
            Some(crop(&[Season::Spring], -1, false)), // Spring grace covers it
            Some(crop(&[Season::Winter], -1, false)), // Winter grace is 0, long over
            Some(crop(&[Season::Summer], -1, false)), // native tomorrow
            None,
        ];

        let mut ctl = controller(GraceDurations::new(28, 0, 0, 0));
        let report = ctl.on_day_ending(&mut farm, date(1, Season::Spring, 28));

        assert!(report.grace_active);
        assert_eq!(report.next_date, date(1, Season::Summer, 1));
        assert!(farm.exempt);
        assert_eq!(report.killed_out_of_grace, 1);
        assert!(!farm.tiles[0].as_ref().unwrap().dead);
        assert!(farm.tiles[1].as_ref().unwrap().dead);
        assert!(!farm.tiles[2].as_ref().unwrap().dead);
    }

    #[test]
    fn test_watched_crop_dies_after_bonus_harvest() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![
            Some(crop(&[Season::Spring], 4, true)),
            Some(crop(&[Season::Spring], 4, true)),
        ];
        let mut ctl = controller(GraceDurations::new(28, 0, 0, 0));

        let today = date(1, Season::Summer, 3);
        ctl.on_day_started(&farm, today.season());
        pick(farm.tiles[0].as_mut().unwrap());

        let report = ctl.on_day_ending(&mut farm, today);

        assert_eq!(report.killed_out_of_grace, 0, "Spring grace still open");
        assert_eq!(report.killed_after_bonus_harvest, 1);
        assert!(farm.tiles[0].as_ref().unwrap().dead, "picked: bonus harvest used");
        assert!(!farm.tiles[1].as_ref().unwrap().dead, "not picked yet");
        assert!(ctl.watched().is_empty(), "watch set is consumed");
    }

    #[test]
    fn test_crop_growing_at_day_start_is_not_watched() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(crop(&[Season::Spring], 4, false))];
        let mut ctl = controller(GraceDurations::new(28, 0, 0, 0));

        let today = date(1, Season::Summer, 1);
        ctl.on_day_started(&farm, today.season());
        assert!(ctl.watched().is_empty());

        // Ripens and gets picked within the day: no bonus-harvest rule.
        let tile = farm.tiles[0].as_mut().unwrap();
        tile.current_phase = tile.total_phases() - 1;
        pick(tile);
        let report = ctl.on_day_ending(&mut farm, today);

        assert_eq!(report.total_killed(), 0);
        assert!(!farm.tiles[0].as_ref().unwrap().dead);
    }

    #[test]
    fn test_condemned_watched_crop_counts_once() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(crop(&[Season::Spring], 4, true))];
        // Spring grace ends on Summer 7; the long Winter grace keeps the pass running.
        let mut ctl = controller(GraceDurations::new(7, 0, 0, 60));

        let today = date(2, Season::Summer, 7);
        ctl.on_day_started(&farm, today.season());
        pick(farm.tiles[0].as_mut().unwrap());
        let report = ctl.on_day_ending(&mut farm, today);

        assert_eq!(report.killed_out_of_grace, 1);
        assert_eq!(report.killed_after_bonus_harvest, 0);
    }

    #[test]
    fn test_before_save_always_clears_flag() {
        let mut farm = FakeFarm::default();
        let mut ctl = controller(GraceDurations::default());

        farm.exempt = true;
        assert!(ctl.on_before_save(&mut farm));
        assert!(!farm.exempt);

        assert!(!ctl.on_before_save(&mut farm));
        assert!(!farm.exempt);
    }

    #[test]
    fn test_day_end_is_idempotent() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![
            Some(crop(&[Season::Spring], -1, false)),
            Some(crop(&[Season::Fall], 4, true)),
            Some(crop(&[Season::Summer], 4, false)),
        ];
        let mut ctl = controller(GraceDurations::new(0, 0, 28, 0));
        let today = date(1, Season::Winter, 2);

        ctl.on_day_started(&farm, today.season());
        let first = ctl.on_day_ending(&mut farm, today);
        let after_first: Vec<_> = farm.tiles.clone();
        let second = ctl.on_day_ending(&mut farm, today);

        assert_eq!(farm.tiles, after_first);
        assert_eq!(first.killed_out_of_grace, 2);
        assert_eq!(second.total_killed(), 0, "dead crops are not killed twice");
        assert_eq!(first.grace_active, second.grace_active);
    }

    #[test]
    fn test_regrown_crop_needs_a_pick_to_die() {
        let mut regrown = crop(&[Season::Spring], 4, true);
        // Picked back in Spring, regrow timer since run out.
        regrown.fully_grown = true;
        regrown.day_of_current_phase = 0;

        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(regrown.clone()), Some(regrown)];
        let mut ctl = controller(GraceDurations::new(28, 0, 0, 0));

        let today = date(1, Season::Summer, 1);
        assert_eq!(ctl.on_day_started(&farm, today.season()), 2);
        pick(farm.tiles[1].as_mut().unwrap());
        let report = ctl.on_day_ending(&mut farm, today);

        assert_eq!(report.killed_after_bonus_harvest, 1);
        assert!(!farm.tiles[0].as_ref().unwrap().dead, "ripe again but not picked today");
        assert!(farm.tiles[1].as_ref().unwrap().dead, "picked out of season");
    }

    #[test]
    fn test_kill_is_reported_on_the_night_it_happens() {
        let mut farm = FakeFarm::default();
        farm.tiles = vec![Some(crop(&[Season::Winter], -1, false))];
        let mut ctl = controller(GraceDurations::new(28, 0, 0, 0));

        let mut today = date(1, Season::Summer, 1);
        let mut killed = 0;
        for _ in 0..5 {
            ctl.on_day_started(&farm, today.season());
            killed += ctl.on_day_ending(&mut farm, today).killed_out_of_grace;
            today = today.add_days(1);
        }

        assert_eq!(killed, 1);
        assert!(farm.tiles[0].as_ref().unwrap().dead);
    }
}
