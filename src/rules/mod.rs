//! UNO rules: turn state, move validation and lobby transitions.
//!
//! Everything here is pure. Functions take a snapshot and return a new one
//! or an `EngineError`; nothing logs, sleeps or touches I/O. The sync layer
//! decides what to persist and whom to tell.

pub mod engine;
pub mod error;
pub mod lobby;
pub mod turn;


pub use engine::{RulesEngine, UnoRules};
pub use error::{EngineError, ErrorCategory, IntegrityError};
pub use turn::{Direction, TurnState};
