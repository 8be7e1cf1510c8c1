use super::frames::{Frame, FrameStore};

/// The shared z cursor linking the twiss chart to the image frames.
///
/// Two interaction modes: a click always moves the cursor; hovering moves it
/// only while scroll mode is on (scrub-by-hover). Whoever replaces the frame
/// store must call [`CursorSync::reset`] so a stale position never references
/// a grid that no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorSync {
    current_z: f64,
    scroll_mode: bool,
}

impl CursorSync {
    pub fn new() -> Self {
        Self {
            current_z: 0.0,
            scroll_mode: false,
        }
    }

    pub fn current_z(&self) -> f64 {
        self.current_z
    }

    pub fn scroll_mode(&self) -> bool {
        self.scroll_mode
    }

    pub fn set_scroll_mode(&mut self, on: bool) {
        self.scroll_mode = on;
    }

    /// Unconditional move (click in either mode).
    pub fn set_z(&mut self, z: f64) {
        self.current_z = z;
    }

    /// Hover move, applied only in scroll mode.
    pub fn on_hover_move(&mut self, z: f64) {
        if self.scroll_mode {
            self.current_z = z;
        }
    }

    /// Back to the grid origin. Called whenever a new simulate response
    /// replaces the frame map.
    pub fn reset(&mut self) {
        self.current_z = 0.0;
    }

    /// The frame nearest the cursor, or `None` when no frames exist.
    pub fn resolve_frame<'a>(&self, frames: &'a FrameStore) -> Option<&'a Frame> {
        frames.nearest(self.current_z)
    }
}

impl Default for CursorSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn click_moves_in_both_modes() {
        let mut cursor = CursorSync::new();
        cursor.set_z(1.5);
        assert_eq!(cursor.current_z(), 1.5);
        cursor.set_scroll_mode(true);
        cursor.set_z(2.0);
        assert_eq!(cursor.current_z(), 2.0);
    }

    #[test]
    fn hover_moves_only_in_scroll_mode() {
        let mut cursor = CursorSync::new();
        cursor.on_hover_move(3.0);
        assert_eq!(cursor.current_z(), 0.0);
        cursor.set_scroll_mode(true);
        cursor.on_hover_move(3.0);
        assert_eq!(cursor.current_z(), 3.0);
    }

    #[test]
    fn resolves_against_frames_and_empty_sentinel() {
        let images: IndexMap<String, String> = [("0.0", "a"), ("1.0", "b")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        let (frames, _) = FrameStore::from_images(&images);

        let mut cursor = CursorSync::new();
        cursor.set_z(0.9);
        assert_eq!(cursor.resolve_frame(&frames).unwrap().image, "b");
        assert!(cursor.resolve_frame(&FrameStore::default()).is_none());

        cursor.reset();
        assert_eq!(cursor.current_z(), 0.0);
    }
}
