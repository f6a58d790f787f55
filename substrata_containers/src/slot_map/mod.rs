pub mod insertion_sorted_slot_map;
pub mod slot_map;
pub mod unique_slot_map;

pub use insertion_sorted_slot_map::InsertionSortSlotMap;
pub use slot_map::SlotMap;
pub use unique_slot_map::UniqueSlotMap;
