// lasttab platform paths
// Resolves where the host keeps its settings file and its SQLite store on
// Windows, macOS and Linux.
//
// Uses `cfg(target_os)` to select the platform implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LASTTAB_DATA_DIR";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `~/.config/lasttab` (or `$XDG_CONFIG_HOME/lasttab`)
/// - **macOS**: `~/Library/Application Support/lasttab`
/// - **Windows**: `%APPDATA%/lasttab`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory, honouring `$LASTTAB_DATA_DIR`.
///
/// - **Linux**: `~/.local/share/lasttab` (or `$XDG_DATA_HOME/lasttab`)
/// - **macOS**: `~/Library/Application Support/lasttab`
/// - **Windows**: `%LOCALAPPDATA%/lasttab`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
