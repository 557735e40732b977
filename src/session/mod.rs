/// Photo session sequencing
///
/// - `machine.rs` - pure countdown/flash/capture state machine
/// - `runner.rs` - tokio driver with cancellable timers
///
/// A session runs the layout's shot count to completion, then signals both
/// surfaces to move on.

pub mod machine;
pub mod runner;

pub use runner::{SessionOutcome, SessionTiming, Sequencer};
