pub mod data_source;
pub mod date_window;
pub mod error;
pub mod progress;
pub mod record;
pub mod roc_date;
