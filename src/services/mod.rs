// lasttab services
// Host configuration loading and saving.

pub mod settings_engine;
