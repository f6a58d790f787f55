pub mod error;
pub mod events;
pub mod proximity_checker;
pub mod timer_queue;

pub use error::ScriptingError;
pub use events::{HandlerEntry, ObjectEventHandlers, ScriptEvaluator, ScriptEventRegistry};
pub use proximity_checker::{ScriptProximityCallbacks, ScriptedObjectProximityChecker, SCRIPT_PROXIMITY_RADIUS};
pub use timer_queue::{Timer, TimerQueue, MAX_NUM_TIMERS};
