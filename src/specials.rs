//! The legacy numeric action specials. Long before callable action
//! functions existed, state actions could name one of these and pass up to
//! five integer arguments; the compiler still accepts them and routes them
//! through the internal dispatcher.

/// `(name, special number, min args, max args)`, sorted by name.
static LINE_SPECIALS: &[(&str, i32, u8, u8)] = &[
    ("acs_execute", 80, 1, 5),
    ("acs_executealways", 226, 1, 5),
    ("acs_lockedexecute", 83, 5, 5),
    ("acs_suspend", 81, 2, 2),
    ("acs_terminate", 82, 2, 2),
    ("ceiling_crushandraise", 42, 3, 3),
    ("ceiling_lowerandcrush", 43, 3, 3),
    ("damagething", 73, 1, 2),
    ("door_close", 10, 2, 3),
    ("door_lockedraise", 13, 4, 5),
    ("door_open", 11, 2, 3),
    ("door_raise", 12, 3, 4),
    ("exit_normal", 243, 0, 1),
    ("exit_secret", 244, 0, 1),
    ("floor_lowerbyvalue", 20, 3, 3),
    ("floor_lowertolowest", 21, 2, 2),
    ("floor_lowertonearest", 22, 2, 2),
    ("floor_raisebyvalue", 23, 3, 3),
    ("floor_raisetohighest", 24, 2, 2),
    ("floor_raisetonearest", 25, 2, 2),
    ("floor_waggle", 138, 5, 5),
    ("light_changetovalue", 112, 2, 2),
    ("light_fade", 113, 3, 3),
    ("light_flicker", 115, 3, 3),
    ("light_glow", 114, 4, 4),
    ("light_lowerbyvalue", 111, 2, 2),
    ("light_raisebyvalue", 110, 2, 2),
    ("light_strobe", 116, 5, 5),
    ("plat_downwaitupstay", 62, 3, 3),
    ("plat_perpetualraise", 60, 3, 3),
    ("plat_stop", 61, 1, 1),
    ("radius_quake", 120, 5, 5),
    ("sector_changesound", 140, 2, 2),
    ("teleport", 70, 1, 3),
    ("teleport_endgame", 75, 0, 0),
    ("teleport_newmap", 74, 2, 3),
    ("teleport_nofog", 71, 1, 3),
    ("thing_activate", 130, 1, 1),
    ("thing_changetid", 176, 2, 2),
    ("thing_damage", 119, 2, 3),
    ("thing_deactivate", 131, 1, 1),
    ("thing_destroy", 133, 1, 2),
    ("thing_hate", 177, 2, 3),
    ("thing_move", 125, 2, 3),
    ("thing_projectile", 134, 5, 5),
    ("thing_projectilegravity", 136, 5, 5),
    ("thing_remove", 132, 1, 1),
    ("thing_setspecial", 127, 5, 5),
    ("thing_spawn", 135, 3, 4),
    ("thing_spawnnofog", 137, 3, 4),
    ("thing_stop", 19, 1, 1),
    ("thrustthing", 72, 2, 4),
    ("thrustthingz", 128, 4, 4),
];

/// Resolve an action name to its numeric special and argument bounds.
/// Returns `None` for anything that is not a legacy special.
pub fn find_line_special(name: &str) -> Option<(i32, u8, u8)> {
    let lower = name.to_ascii_lowercase();
    LINE_SPECIALS
        .binary_search_by(|entry| entry.0.cmp(lower.as_str()))
        .ok()
        .map(|i| {
            let (_, special, min_args, max_args) = LINE_SPECIALS[i];
            (special, min_args, max_args)
        })
}
