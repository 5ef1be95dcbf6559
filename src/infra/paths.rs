// src/infra/paths.rs — Config and data locations
//
// TRIPKOI_HOME overrides everything. Without it, config lives in ~/.tripkoi/
// and saved itineraries under the XDG data dir.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the TRIPKOI_HOME override, if set.
fn tripkoi_home() -> Option<PathBuf> {
    std::env::var_os("TRIPKOI_HOME").map(PathBuf::from)
}

/// Home directory, or the working directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $TRIPKOI_HOME/ or ~/.tripkoi/
pub fn config_dir() -> PathBuf {
    if let Some(home) = tripkoi_home() {
        return home;
    }
    dirs_home().join(".tripkoi")
}

/// Data directory: $TRIPKOI_HOME/data/ or ~/.local/share/tripkoi/
pub fn data_dir() -> PathBuf {
    if let Some(home) = tripkoi_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "tripkoi")
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where `tripkoi plan --save` writes itinerary JSON.
pub fn itineraries_dir() -> PathBuf {
    data_dir().join("itineraries")
}
