pub mod controls;
pub mod video;

pub use controls::PlayerControls;
pub use video::{fit_size, VideoSurface};
