pub mod commands;
pub mod state;
pub mod types;

pub use commands::OverlayCommand;
pub use state::{ColorSample, StoreUpdate, ViewportState, ZOOM_MAX, ZOOM_MIN};
pub use types::{Color, Point};
