use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ContainerErrors {
    #[error("Expected a valid slot, got null")]
    NonexistentSlot,
    #[error("Slot generation does not match, slot has been removed and replaced")]
    GenerationMismatch,
}
