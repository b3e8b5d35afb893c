//! Shared real-time Game of Life world.
//!
//! One driver thread owns a double-buffered [`World`] and advances it with a
//! tiled worker fan-out; observers edit it through queued intents while
//! paused and receive run-length encoded frames after every generation.

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod cell;
pub mod grid;
pub mod rules;
pub mod neighborhood;
pub mod color;
pub mod scheduler;
pub mod pattern;
pub mod world;
pub mod command;
pub mod codec;
pub mod message;
pub mod config;
pub mod observers;
pub mod driver;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use cell::{Cell, Rgb};
pub use codec::{CodecError, Replica};
pub use command::{CommandError, CommandState, Intent, Outcome, RunState};
pub use config::{ConfigError, SimulationConfig};
pub use driver::{spawn, Cycle, Driver, IntakeError, Request, SimulationHandle};
pub use grid::Grid;
pub use message::Message;
pub use observers::{ObserverId, Observers};
pub use pattern::{Pattern, PatternError, PatternLibrary};
pub use rules::RuleTable;
pub use world::{World, WorldError};
