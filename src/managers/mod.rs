// lasttab state managers
// Managers own the tracker state and the actions resolved from it.

pub mod history_tracker;
pub mod resolver;
pub mod tab_history;
