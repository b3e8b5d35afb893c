//! Pause/edit gating for intents coming from observers.

use thiserror::Error;
use tracing::{debug, info};

use crate::pattern::PatternLibrary;
use crate::world::{World, WorldError};

// ============================================================================
// TYPES
// ============================================================================

/// A command with the sender's colour already attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    TogglePause,
    MarkCell { x: u32, y: u32, color: u32 },
    PlaceRle { pattern: String, x: u32, y: u32, color: u32 },
    ClearBoard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Edit received while running; dropped without touching the world.
    Suppressed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Bounds(#[from] WorldError),
    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct CommandState {
    state: RunState,
}

impl CommandState {
    pub fn new(paused: bool) -> Self {
        let state = if paused { RunState::Paused } else { RunState::Running };
        CommandState { state }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn paused(&self) -> bool {
        self.state == RunState::Paused
    }

    pub fn apply(
        &mut self,
        world: &mut World,
        patterns: &PatternLibrary,
        intent: Intent,
    ) -> Result<Outcome, CommandError> {
        match intent {
            Intent::TogglePause => {
                self.state = match self.state {
                    RunState::Running => RunState::Paused,
                    RunState::Paused => RunState::Running,
                };
                info!(state = ?self.state, tick = world.tick(), "pause toggled");
            }
            Intent::ClearBoard => {
                world.clear();
                info!(tick = world.tick(), "board cleared");
            }
            Intent::MarkCell { .. } | Intent::PlaceRle { .. } if !self.paused() => {
                debug!(?intent, "edit ignored while running");
                return Ok(Outcome::Suppressed);
            }
            Intent::MarkCell { x, y, color } => world.mark_alive(x, y, color)?,
            Intent::PlaceRle { pattern, x, y, color } => {
                let stamp = patterns
                    .get(&pattern)
                    .ok_or(CommandError::UnknownPattern(pattern.clone()))?;
                world.place_pattern(stamp, x, y, color)?;
            }
        }
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::pattern::Pattern;

    const RED: u32 = 0xFF00_0000;

    fn setup(paused: bool) -> (CommandState, World, PatternLibrary) {
        let mut patterns = PatternLibrary::new();
        patterns.insert("block", Pattern::from_rows("block", &["oo", "oo"]));
        (CommandState::new(paused), World::new(8, 8).unwrap(), patterns)
    }

    #[test]
    fn test_toggle_always_flips() {
        let (mut state, mut world, patterns) = setup(false);
        assert_eq!(state.state(), RunState::Running);
        state.apply(&mut world, &patterns, Intent::TogglePause).unwrap();
        assert!(state.paused());
        state.apply(&mut world, &patterns, Intent::TogglePause).unwrap();
        assert!(!state.paused());
    }

    #[test]
    fn test_edits_suppressed_while_running() {
        let (mut state, mut world, patterns) = setup(false);
        let mark = Intent::MarkCell { x: 1, y: 1, color: RED };
        let place = Intent::PlaceRle { pattern: "block".into(), x: 2, y: 2, color: RED };

        assert_eq!(state.apply(&mut world, &patterns, mark), Ok(Outcome::Suppressed));
        assert_eq!(state.apply(&mut world, &patterns, place), Ok(Outcome::Suppressed));
        assert_eq!(world.grid().alive_count(), 0);
    }

    #[test]
    fn test_edits_applied_while_paused() {
        let (mut state, mut world, patterns) = setup(true);
        let mark = Intent::MarkCell { x: 0, y: 0, color: RED };
        let place = Intent::PlaceRle { pattern: "block".into(), x: 4, y: 4, color: RED };

        assert_eq!(state.apply(&mut world, &patterns, mark), Ok(Outcome::Applied));
        assert_eq!(state.apply(&mut world, &patterns, place), Ok(Outcome::Applied));
        assert_eq!(world.grid().alive_count(), 5);
        assert_eq!(world.cell(0, 0).map(|c| c.vitality()), Some(0xFF));
        assert_eq!(world.cell(5, 5).map(|c| c.color()), Some(RED));
    }

    #[test]
    fn test_mark_cell_changes_only_target() {
        let (mut state, mut world, patterns) = setup(true);
        world.mark_alive(1, 1, 0x00FF_0000).unwrap();
        let before = world.grid().clone();

        let mark = Intent::MarkCell { x: 3, y: 5, color: RED };
        assert_eq!(state.apply(&mut world, &patterns, mark), Ok(Outcome::Applied));

        let changed: Vec<usize> = before
            .cells()
            .iter()
            .zip(world.grid().cells())
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![5 * 8 + 3]);
        assert_eq!(world.cell(3, 5), Some(Cell::new_alive(RED)));
    }

    #[test]
    fn test_clear_works_in_both_states() {
        for paused in [true, false] {
            let (mut state, mut world, patterns) = setup(true);
            world.mark_alive(3, 3, RED).unwrap();
            if !paused {
                state.apply(&mut world, &patterns, Intent::TogglePause).unwrap();
            }
            let outcome = state.apply(&mut world, &patterns, Intent::ClearBoard);
            assert_eq!(outcome, Ok(Outcome::Applied));
            assert_eq!(world.grid().alive_count(), 0);
        }
    }

    #[test]
    fn test_failures_leave_world_untouched() {
        let (mut state, mut world, patterns) = setup(true);
        world.mark_alive(1, 1, RED).unwrap();
        let before = world.grid().clone();

        let unknown = Intent::PlaceRle { pattern: "gosper".into(), x: 0, y: 0, color: RED };
        assert_eq!(
            state.apply(&mut world, &patterns, unknown),
            Err(CommandError::UnknownPattern("gosper".into()))
        );

        let edge = Intent::PlaceRle { pattern: "block".into(), x: 7, y: 0, color: RED };
        assert!(matches!(
            state.apply(&mut world, &patterns, edge),
            Err(CommandError::Bounds(WorldError::PatternOutOfBounds { .. }))
        ));

        let outside = Intent::MarkCell { x: 8, y: 8, color: RED };
        assert!(state.apply(&mut world, &patterns, outside).is_err());

        assert_eq!(world.grid(), &before);
    }
}
