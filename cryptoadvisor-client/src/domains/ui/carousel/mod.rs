//! Paginated carousel over a filtered, sorted collection
//!
//! [`CarouselController`] holds the state machine; [`MountedCarousel`] binds
//! one to a view's lifetime together with its autoplay timer and keyboard
//! listener.

pub mod keyboard;
pub mod messages;
pub mod mounted;
pub mod state;
pub mod types;

pub use keyboard::KeyboardHub;
pub use messages::{CarouselMessage, NavKey};
pub use mounted::MountedCarousel;
pub use state::CarouselController;
pub use types::{CarouselConfig, CarouselError, CarouselItem, CarouselKey};
