//! Inputs accepted by a carousel controller

/// Navigation keys a carousel reacts to. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl NavKey {
    /// Map a DOM-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => NavKey::ArrowLeft,
            "ArrowRight" => NavKey::ArrowRight,
            _ => NavKey::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselMessage {
    // Navigation
    NextPage,
    PrevPage,
    GoTo(i64),
    Key(NavKey),

    // Presentation
    ToggleExpand(usize),
    ToggleAutoplay,
    SetPageSize(usize),
}
