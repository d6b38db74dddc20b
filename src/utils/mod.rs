pub mod format;
pub mod time;
pub mod validation;
pub mod worklog_manager;
