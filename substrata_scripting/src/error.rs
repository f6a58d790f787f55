use thiserror::Error;
use substrata_protocol::Uid;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum ScriptingError {
    #[error("script {0} has no free timer slots (MAX_NUM_TIMERS reached)")]
    TimerSlotsExhausted(Uid),
}
