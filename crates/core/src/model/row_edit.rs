use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    View,
    Edit,
}

/// Per-row edit/view toggle for the segment table.
///
/// Edits made while a row is in `Edit` are committed to the beamline
/// field-by-field as they happen; leaving `Edit` performs no rollback. There
/// is deliberately no cancel path. New and imported rows start in `View`.
#[derive(Debug, Clone, Default)]
pub struct RowEditState {
    editing: HashSet<u32>,
}

impl RowEditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self, id: u32) -> RowMode {
        if self.editing.contains(&id) {
            RowMode::Edit
        } else {
            RowMode::View
        }
    }

    /// Flip the row's state, returning the new mode.
    pub fn toggle(&mut self, id: u32) -> RowMode {
        if self.editing.remove(&id) {
            RowMode::View
        } else {
            self.editing.insert(id);
            RowMode::Edit
        }
    }

    /// Drop edit flags for rows that no longer exist (after delete/import).
    pub fn prune(&mut self, live_ids: impl IntoIterator<Item = u32>) {
        let live: HashSet<u32> = live_ids.into_iter().collect();
        self.editing.retain(|id| live.contains(id));
    }

    /// Back to `View` for every row.
    pub fn clear(&mut self) {
        self.editing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_start_in_view_and_toggle_round_trips() {
        let mut state = RowEditState::new();
        assert_eq!(state.mode(1), RowMode::View);
        assert_eq!(state.toggle(1), RowMode::Edit);
        assert_eq!(state.mode(1), RowMode::Edit);
        assert_eq!(state.mode(2), RowMode::View);
        assert_eq!(state.toggle(1), RowMode::View);
        assert_eq!(state.mode(1), RowMode::View);
    }

    #[test]
    fn prune_drops_stale_rows_only() {
        let mut state = RowEditState::new();
        state.toggle(1);
        state.toggle(2);
        state.prune([2, 3]);
        assert_eq!(state.mode(1), RowMode::View);
        assert_eq!(state.mode(2), RowMode::Edit);
    }
}
