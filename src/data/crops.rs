use crate::shared::*;

/// Populate the CropRegistry with all crop definitions.
///
/// Days to first harvest:
///   Spring: turnip (4d), potato (6d), cauliflower (12d), strawberry (8d, regrows 4d)
///   Summer: melon (12d), tomato (11d, regrows 4d), blueberry (13d, regrows 4d)
///   Fall:   eggplant (13d, regrows 5d), pumpkin (13d), cranberry (7d, regrows 5d)
///   Multi:  corn (Summer + Fall, 14d, regrows 4d), coffee (Spring + Summer, 10d, regrows 2d)
///
/// `phase_days` lists how long each growth phase lasts. The phase after the
/// last entry is the harvest phase.
pub fn populate_crops(registry: &mut CropRegistry) {
    let crops = [
        // ── Spring Crops ────────────────────────────────────────────────────────
        crop("turnip", "Turnip", &[Season::Spring], &[1, 1, 1, 1], -1),
        crop("potato", "Potato", &[Season::Spring], &[1, 2, 2, 1], -1),
        crop("cauliflower", "Cauliflower", &[Season::Spring], &[1, 2, 4, 4, 1], -1),
        crop("strawberry", "Strawberry", &[Season::Spring], &[1, 1, 2, 4], 4),
        // ── Summer Crops ────────────────────────────────────────────────────────
        crop("melon", "Melon", &[Season::Summer], &[1, 2, 3, 4, 2], -1),
        crop("tomato", "Tomato", &[Season::Summer], &[1, 2, 3, 4, 1], 4),
        crop("blueberry", "Blueberry", &[Season::Summer], &[1, 3, 3, 4, 2], 4),
        // ── Fall Crops ──────────────────────────────────────────────────────────
        crop("eggplant", "Eggplant", &[Season::Fall], &[1, 2, 4, 4, 2], 5),
        crop("pumpkin", "Pumpkin", &[Season::Fall], &[1, 2, 4, 4, 2], -1),
        crop("cranberry", "Cranberry", &[Season::Fall], &[1, 1, 2, 3], 5),
        // ── Multi-season Crops ──────────────────────────────────────────────────
        crop("corn", "Corn", &[Season::Summer, Season::Fall], &[1, 2, 3, 4, 3, 1], 4),
        crop("coffee", "Coffee", &[Season::Spring, Season::Summer], &[1, 2, 2, 3, 2], 2),
    ];

    for def in crops {
        registry.crops.insert(def.id.clone(), def);
    }
}

fn crop(id: &str, name: &str, seasons: &[Season], phase_days: &[u32], regrow: i32) -> CropDef {
    CropDef {
        id: id.into(),
        name: name.into(),
        seed_id: format!("{}_seeds", id),
        seasons: seasons.to_vec(),
        phase_days: phase_days.to_vec(),
        regrow_after_harvest: regrow,
    }
}
