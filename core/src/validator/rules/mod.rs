//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `loop_control.rs` - `break`/`continue` outside of a loop
//! - `unreachable_code.rs` - Statements after the flow has left the block
//! - `empty_race_case.rs` - `await one` races whose winner can't be told apart

mod empty_race_case;
mod loop_control;
mod unreachable_code;

pub use empty_race_case::EmptyRaceCaseRule;
pub use loop_control::LoopControlRule;
pub use unreachable_code::UnreachableCodeRule;
