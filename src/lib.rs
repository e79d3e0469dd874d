pub mod app;
pub mod config;
pub mod error;
pub mod player;
pub mod time;
pub mod timer;
pub mod transport;
pub mod ui;

pub use app::AgudieApp;
pub use config::PlayerConfig;
pub use error::{AgudieError, Result};
pub use player::Player;
pub use transport::{MediaEngine, PlayButton, PlayPause, Transport};
