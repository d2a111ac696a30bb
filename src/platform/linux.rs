// lasttab platform paths for Linux
// Config: ~/.config/lasttab
// Data:   ~/.local/share/lasttab

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_CONFIG_HOME/lasttab`, falling back to `~/.config/lasttab`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("lasttab"),
        _ => home_dir().join(".config").join("lasttab"),
    }
}

/// `$XDG_DATA_HOME/lasttab`, falling back to `~/.local/share/lasttab`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("lasttab"),
        _ => home_dir().join(".local").join("share").join("lasttab"),
    }
}
