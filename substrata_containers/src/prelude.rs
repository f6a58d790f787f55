pub use super::deferred_deletion::{
    DeferredDeletion, DeferredDeletionSlot, DeferredDeletionSlotInner,
};
pub use super::erased_storage::*;
pub use super::error;
pub use super::free_list::*;
pub use super::slot::{DefaultSlot, Slot, SlotWithGeneration};
pub use super::slot_map::{InsertionSortSlotMap, SlotMap, UniqueSlotMap};
pub use super::sparse_slot_map::*;
pub use super::traits::*;
pub use dashmap;
