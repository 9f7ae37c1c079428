use std::collections::HashMap;

use web_sys::HtmlElement;

use muralboard_shared::{ImageSource, Submission, Tool};

use crate::canvas::CanvasStack;
use crate::presence::PresenceMap;
use crate::votes::VoteBook;

/// Color assigned to the local user before the server's welcome arrives.
pub const DEFAULT_USER_COLOR: &str = "#4CAF50";

pub const MIN_BRUSH_SIZE: u8 = 1;
pub const MAX_BRUSH_SIZE: u8 = 10;
pub const DEFAULT_BRUSH_SIZE: u8 = 5;

/// Pixel dimensions and provenance of the currently mounted base image.
/// Set once per image load, read by the brush engine until the next load.
#[derive(Clone, Copy, Debug)]
pub struct LoadedImage {
    pub width: f64,
    pub height: f64,
    pub source: ImageSource,
}

/// All mutable client state for one editing session. Held behind a single
/// `Rc<RefCell<Session>>` so pointer, socket, and UI handlers share it
/// without module-level globals.
pub struct Session {
    pub stack: Option<CanvasStack>,
    pub image: Option<LoadedImage>,
    pub tool: Tool,
    pub brush_size: u8,
    pub is_drawing: bool,
    pub last_x: f64,
    pub last_y: f64,
    pub user_id: Option<String>,
    pub user_color: String,
    pub peers: PresenceMap,
    pub bubbles: HashMap<String, HtmlElement>,
    pub votes: VoteBook,
    pub submissions: Vec<Submission>,
    load_generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            stack: None,
            image: None,
            tool: Tool::Brush,
            brush_size: DEFAULT_BRUSH_SIZE,
            is_drawing: false,
            last_x: 0.0,
            last_y: 0.0,
            user_id: None,
            user_color: DEFAULT_USER_COLOR.to_string(),
            peers: PresenceMap::default(),
            bubbles: HashMap::new(),
            votes: VoteBook::default(),
            submissions: Vec::new(),
            load_generation: 0,
        }
    }

    /// Identity used for vote bookkeeping: the socket id once connected,
    /// `anonymous` before that.
    pub fn vote_user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }

    pub fn set_brush_size(&mut self, size: u8) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// Starts a new image load and returns its generation. A load callback
    /// that resolves after a newer load began must compare its generation
    /// against `load_generation()` and discard itself on mismatch.
    pub fn begin_image_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load_generation
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    /// Effective stroke width for the local brush settings, in canvas
    /// pixels. `None` until an image is mounted.
    pub fn current_brush_width(&self) -> Option<f64> {
        let stack = self.stack.as_ref()?;
        let image = self.image.as_ref()?;
        Some(crate::brush::effective_brush_width(
            self.brush_size,
            image.width,
            image.height,
            f64::from(stack.width),
            f64::from(stack.height),
            image.source,
        ))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brush_size_is_clamped_to_slider_range() {
        let mut session = Session::new();
        session.set_brush_size(0);
        assert_eq!(session.brush_size, MIN_BRUSH_SIZE);
        session.set_brush_size(99);
        assert_eq!(session.brush_size, MAX_BRUSH_SIZE);
        session.set_brush_size(7);
        assert_eq!(session.brush_size, 7);
    }

    #[test]
    fn stale_load_generation_no_longer_matches() {
        let mut session = Session::new();
        let first = session.begin_image_load();
        let second = session.begin_image_load();
        assert_ne!(first, session.load_generation());
        assert_eq!(second, session.load_generation());
    }

    #[test]
    fn vote_identity_falls_back_to_anonymous() {
        let mut session = Session::new();
        assert_eq!(session.vote_user_id(), "anonymous");
        session.user_id = Some("sock-1".to_string());
        assert_eq!(session.vote_user_id(), "sock-1");
    }
}
