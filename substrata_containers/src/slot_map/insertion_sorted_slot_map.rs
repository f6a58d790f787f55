use crate::error::ContainerErrors;
use crate::prelude::Slot;
use std::ops::{Deref, DerefMut};

/// Regular slot map implementation

#[derive(Debug, PartialEq, Eq)]
pub struct InsertionSortSlotMap<T: Eq + PartialEq + PartialOrd + Ord> {
    // usize is a reference to the proxy slot index
    pub(crate) handle: super::SlotMap<T>,
}

impl<T: Eq + PartialEq + PartialOrd + Ord> Default for InsertionSortSlotMap<T> {
    fn default() -> Self {
        Self {
            handle: super::SlotMap::default(),
        }
    }
}

impl<T: Eq + PartialEq + PartialOrd + Ord> Deref for InsertionSortSlotMap<T> {
    type Target = super::SlotMap<T>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Eq + PartialEq + PartialOrd + Ord> DerefMut for InsertionSortSlotMap<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}

impl<T: Eq + PartialEq + PartialOrd + Ord + std::fmt::Debug> InsertionSortSlotMap<T> {
    /// Insertion cost is O(n^2) and is very computationally expensive
    pub fn insertion_sort(&mut self, element: T) -> Result<Slot<T>, ContainerErrors> {
        let position_in_vec = self
            .handle
            .data
            .binary_search_by(|(probe, _)| probe.cmp(&element))
            .unwrap_or_else(|e| e);

        // get next free slot
        let free_slot_index: usize = if let Some(index) = self.free_list.pop() {
            index
        } else {
            self.slots.push(Slot::new(0, 0));
            (self.slots.len() - 1) as u64
        } as usize;
        // update id
        self.slots[free_slot_index].id = position_in_vec as u64;

        self.data
            .insert(position_in_vec, (element, free_slot_index as u64));
        // update all mappings after
        let updates: Vec<(u64, usize)> = self
            .data
            .iter()
            .enumerate()
            .skip(position_in_vec + 1)
            .map(|(i, &(_, slot_index))| (slot_index, i))
            .collect();

        for (slot_index, new_id) in updates {
            self.slots[slot_index as usize].id = new_id as u64;
        }

        // produce and out slot from mapping to the proxy slot
        let out_slot = Slot::new(
            free_slot_index as u64,
            self.slots[free_slot_index].generation,
        );
        Ok(out_slot)
    }

    /// Removes a slot as according to insertion removal
    pub fn insertion_removal(&mut self, slot: Slot<T>) -> Result<T, ContainerErrors> {
        if let Some(proxy_slot) = self.slots.get_mut(slot.id as usize).map(|proxy_slot| {
            if slot.generation != proxy_slot.generation {
                return Err(ContainerErrors::GenerationMismatch);
            }
            // increment generation
            proxy_slot.generation += 1;
            Ok::<Slot<T>, ContainerErrors>(proxy_slot.clone())
        }) {
            let proxy_slot = proxy_slot?;
            // swap (if needed) data before popping
            if !self.data.is_empty() && proxy_slot.id != (self.data.len() - 1) as u64 {
                let proxy_slot_data_index = proxy_slot.id;
                let last_index = self.data.len() - 1;
                // swap with the last
                self.data.swap(last_index, proxy_slot_data_index as usize);
                // update the indirect slot
                let swapped_proxy = self.data.get(proxy_slot_data_index as usize).unwrap().1;
                // since we swapped, we must update to the indirect to point to the data index
                self.slots
                    .get_mut(swapped_proxy as usize)
                    .map(|slot| slot.id = proxy_slot_data_index);
            }
            // to be removed must be last in data and slots
            let data = self.data.pop().unwrap();
            self.free_list.push(slot.id);
            Ok(data.0)
        } else {
            Err(ContainerErrors::NonexistentSlot)
        }
    }
}
