//! Grace windows: after a season instance ends, its crops stay protected for
//! that season's configured number of days.

use crate::config::GraceDurations;
use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GracePolicy {
    durations: GraceDurations,
}

impl GracePolicy {
    pub fn new(durations: GraceDurations) -> Self {
        Self { durations }
    }

    /// Whether the grace window of the season instance ending on
    /// `season_end` still covers `as_of`. Permanent grace always does.
    pub fn is_season_grace_active(
        &self,
        as_of: CalendarDate,
        season_end: CalendarDate,
        season: Season,
    ) -> bool {
        if self.durations.is_permanent(season) {
            return true;
        }
        let grace_days = i64::from(self.durations.grace_duration_days(season));
        as_of <= season_end.add_days(grace_days)
    }

    /// Whether any of the last [`MAX_LOOKBACK_SEASONS`] season instances
    /// before `as_of` still has an open grace window.
    pub fn any_grace_active(&self, as_of: CalendarDate) -> bool {
        previous_season_instances(as_of)
            .any(|(end, season)| self.is_season_grace_active(as_of, end, season))
    }

    /// Like [`Self::any_grace_active`], but only counts instances of
    /// `candidate`, i.e. whether crops native to `candidate` are still covered.
    pub fn is_season_protected_by_grace(&self, as_of: CalendarDate, candidate: Season) -> bool {
        previous_season_instances(as_of)
            .filter(|&(_, season)| season == candidate)
            .any(|(end, season)| self.is_season_grace_active(as_of, end, season))
    }
}

/// End date and season of each season instance before `as_of`, newest first,
/// stopping at the epoch.
fn previous_season_instances(as_of: CalendarDate) -> impl Iterator<Item = (CalendarDate, Season)> {
    let current = as_of.season_instance();
    (1..=MAX_LOOKBACK_SEASONS)
        .map_while(move |back| current.checked_sub(back))
        .map(|instance| (CalendarDate::season_instance_end(instance), Season::from_index(instance)))
}
