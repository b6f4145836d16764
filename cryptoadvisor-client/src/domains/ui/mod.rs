//! UI/View domain
//!
//! Presentation state that outlives a single render but not the view that
//! owns it.

pub mod carousel;

pub use carousel::{
    CarouselController, CarouselKey, KeyboardHub, MountedCarousel,
};
