//! Per-crop predicates: harvest readiness, watch-worthiness, and the final
//! kill decision.

use super::host::HostCrop;
use super::policy::GracePolicy;
use crate::shared::{CalendarDate, Season};

/// The crop sits in its final phase and can be picked right now: either it
/// has never been harvested, or its regrow timer has run out.
pub fn is_harvestable<C: HostCrop>(crop: &C) -> bool {
    crop.current_phase() + 1 >= crop.total_phases()
        && (!crop.fully_grown() || crop.day_of_current_phase() <= 0)
}

pub fn is_regrowing<C: HostCrop>(crop: &C) -> bool {
    crop.regrow_after_harvest() > -1
}

/// A regrowing crop, outside its native seasons, that is ready to pick.
/// Such a crop gets one last harvest and then dies.
pub fn is_suspicious<C: HostCrop>(crop: &C, current_season: Season) -> bool {
    !crop.is_dead()
        && is_regrowing(crop)
        && !crop.native_seasons().contains(&current_season)
        && is_harvestable(crop)
}

/// Whether the crop must die on `as_of`. Absent and already dead crops,
/// crops in a native season, and crops whose native season is still in
/// grace are left alone.
pub fn should_kill<C: HostCrop>(crop: Option<&C>, as_of: CalendarDate, policy: &GracePolicy) -> bool {
    let Some(crop) = crop.filter(|crop| !crop.is_dead()) else {
        return false;
    };

    let natives = crop.native_seasons();
    if natives.contains(&as_of.season()) {
        return false;
    }

    !natives
        .iter()
        .any(|&season| policy.is_season_protected_by_grace(as_of, season))
}
