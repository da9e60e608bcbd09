//! Well-known target names of the stock game program
//!
//! These strings must match the member names the program exposes on its
//! root scope. Configuration may override each of them.

/// Start-up entry point wrapped by bootstrap
pub const START_EXPORTED_GAME: &str = "startExportedGame";

/// Parses the serialized game data into the world
pub const PARSE_WORLD: &str = "parseWorld";

/// Called when a dialog box closes
pub const ON_EXIT_DIALOG: &str = "onExitDialog";

/// Resets all game data (restart, reload)
pub const CLEAR_GAME_DATA: &str = "clearGameData";

/// Object under which dialog tag functions are installed
pub const DIALOG_FUNCTIONS_ROOT: &str = "kitsy.dialogFunctions";

/// Collected target names for iteration
pub const WELL_KNOWN_TARGETS: &[(&str, &str)] = &[
    ("StartExportedGame", START_EXPORTED_GAME),
    ("ParseWorld", PARSE_WORLD),
    ("OnExitDialog", ON_EXIT_DIALOG),
    ("ClearGameData", CLEAR_GAME_DATA),
    ("DialogFunctionsRoot", DIALOG_FUNCTIONS_ROOT),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetPath;

    #[test]
    fn test_well_known_targets_are_valid_paths() {
        for (name, path) in WELL_KNOWN_TARGETS {
            assert!(TargetPath::parse(path).is_ok(), "{} is not a valid path", name);
        }
    }
}
