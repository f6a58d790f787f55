//! Single min-heap timer queue (§4.L) shared by every script evaluator.
//! Each script reserves up to `MAX_NUM_TIMERS` slots; timer IDs increase
//! monotonically per script to avoid ABA confusion between an expired
//! timer's ID and a newly-allocated one that happens to reuse a slot.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use bevy_ecs::prelude::Resource;
use substrata_protocol::Uid;

use crate::error::ScriptingError;

pub const MAX_NUM_TIMERS: usize = 4;

#[derive(Debug, Clone)]
pub struct Timer {
    pub script_id: Uid,
    pub timer_id: u32,
    pub trigger_time: f64,
    /// `Some(period)` for a repeating timer. The foreground re-adds it
    /// after firing; the queue itself never re-inserts automatically.
    pub repeat_period: Option<f64>,
}

#[derive(Debug, Clone)]
struct OrderedTimer(Timer);

impl PartialEq for OrderedTimer {
    fn eq(&self, other: &Self) -> bool {
        self.0.trigger_time == other.0.trigger_time
    }
}
impl Eq for OrderedTimer {}
impl PartialOrd for OrderedTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on
        // trigger_time.
        other.0.trigger_time.total_cmp(&self.0.trigger_time)
    }
}

#[derive(Default, Resource)]
pub struct TimerQueue {
    heap: BinaryHeap<OrderedTimer>,
    per_script_count: HashMap<Uid, usize>,
    per_script_next_id: HashMap<Uid, u32>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a slot for `script_id` and schedules the timer, returning
    /// its monotonically-increasing `timer_id`. Fails once the script
    /// already holds `MAX_NUM_TIMERS` outstanding timers.
    pub fn add_timer(
        &mut self,
        script_id: Uid,
        trigger_time: f64,
        repeat_period: Option<f64>,
    ) -> Result<u32, ScriptingError> {
        let count = self.per_script_count.entry(script_id).or_insert(0);
        if *count >= MAX_NUM_TIMERS {
            return Err(ScriptingError::TimerSlotsExhausted(script_id));
        }
        *count += 1;

        let next_id = self.per_script_next_id.entry(script_id).or_insert(0);
        let timer_id = *next_id;
        *next_id += 1;

        self.heap.push(OrderedTimer(Timer { script_id, timer_id, trigger_time, repeat_period }));
        Ok(timer_id)
    }

    /// Pops every timer with `trigger_time <= now` into `out`, freeing their
    /// script's reserved slot.
    pub fn update(&mut self, now: f64, out: &mut Vec<Timer>) {
        while let Some(top) = self.heap.peek() {
            if top.0.trigger_time > now {
                break;
            }
            let OrderedTimer(timer) = self.heap.pop().unwrap();
            if let Some(count) = self.per_script_count.get_mut(&timer.script_id) {
                *count = count.saturating_sub(1);
            }
            out.push(timer);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn outstanding_for(&self, script_id: Uid) -> usize {
        self.per_script_count.get(&script_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_trigger_time_order() {
        let mut queue = TimerQueue::new();
        let script = Uid(1);
        queue.add_timer(script, 5.0, None).unwrap();
        queue.add_timer(script, 1.0, None).unwrap();
        queue.add_timer(script, 3.0, None).unwrap();

        let mut out = Vec::new();
        queue.update(10.0, &mut out);
        let times: Vec<f64> = out.iter().map(|t| t.trigger_time).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn update_only_pops_due_timers() {
        let mut queue = TimerQueue::new();
        let script = Uid(1);
        queue.add_timer(script, 5.0, None).unwrap();
        queue.add_timer(script, 15.0, None).unwrap();

        let mut out = Vec::new();
        queue.update(10.0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn max_num_timers_is_enforced_per_script() {
        let mut queue = TimerQueue::new();
        let script = Uid(1);
        for i in 0..MAX_NUM_TIMERS {
            queue.add_timer(script, i as f64, None).unwrap();
        }
        assert!(queue.add_timer(script, 100.0, None).is_err());
    }

    #[test]
    fn firing_a_timer_frees_its_slot_for_reuse() {
        let mut queue = TimerQueue::new();
        let script = Uid(1);
        for i in 0..MAX_NUM_TIMERS {
            queue.add_timer(script, i as f64, None).unwrap();
        }
        let mut out = Vec::new();
        queue.update(0.0, &mut out);
        assert_eq!(out.len(), 1);
        assert!(queue.add_timer(script, 50.0, None).is_ok());
    }

    #[test]
    fn timer_ids_are_monotonic_per_script() {
        let mut queue = TimerQueue::new();
        let script = Uid(1);
        let a = queue.add_timer(script, 1.0, None).unwrap();
        let mut out = Vec::new();
        queue.update(5.0, &mut out);
        let b = queue.add_timer(script, 2.0, None).unwrap();
        assert!(b > a);
    }
}
