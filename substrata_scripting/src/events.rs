//! Per-object scripted event handler lists (§4.L). Each object owns up to
//! six handler lists; execution walks the list and swap-removes any entry
//! whose script evaluator has been dropped, rather than pruning eagerly.

use std::collections::HashMap;
use std::sync::Weak;

use bevy_ecs::prelude::Resource;
use substrata_protocol::Uid;

/// The Lua VM is out of scope (§1); a script evaluator is represented only
/// as this trait object so the event system has something concrete to call
/// through without depending on a Lua crate.
pub trait ScriptEvaluator: Send + Sync {
    fn call(&self, fn_ref: &str, object_uid: Uid);
}

#[derive(Clone)]
pub struct HandlerEntry {
    pub evaluator: Weak<dyn ScriptEvaluator>,
    pub fn_ref: String,
}

impl HandlerEntry {
    pub fn new(evaluator: Weak<dyn ScriptEvaluator>, fn_ref: impl Into<String>) -> Self {
        Self { evaluator, fn_ref: fn_ref.into() }
    }
}

#[derive(Default, Clone)]
pub struct ObjectEventHandlers {
    pub on_user_used: Vec<HandlerEntry>,
    pub on_user_touched: Vec<HandlerEntry>,
    pub on_user_moved_near_to: Vec<HandlerEntry>,
    pub on_user_moved_away_from: Vec<HandlerEntry>,
    pub on_user_entered_parcel: Vec<HandlerEntry>,
    pub on_user_exited_parcel: Vec<HandlerEntry>,
}

impl ObjectEventHandlers {
    fn run_list(list: &mut Vec<HandlerEntry>, object_uid: Uid) {
        let mut i = 0;
        while i < list.len() {
            match list[i].evaluator.upgrade() {
                Some(eval) => {
                    eval.call(&list[i].fn_ref, object_uid);
                    i += 1;
                }
                None => {
                    list.swap_remove(i);
                }
            }
        }
    }

    pub fn fire_user_used(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_used, object_uid);
    }
    pub fn fire_user_touched(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_touched, object_uid);
    }
    pub fn fire_user_moved_near_to(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_moved_near_to, object_uid);
    }
    pub fn fire_user_moved_away_from(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_moved_away_from, object_uid);
    }
    pub fn fire_user_entered_parcel(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_entered_parcel, object_uid);
    }
    pub fn fire_user_exited_parcel(&mut self, object_uid: Uid) {
        Self::run_list(&mut self.on_user_exited_parcel, object_uid);
    }
}

/// Owns the per-object handler lists for every scripted object in the
/// world. A plain map keyed by object UID, matching `WorldState`'s own
/// container style (§3, §9).
#[derive(Default, Resource)]
pub struct ScriptEventRegistry {
    handlers: HashMap<Uid, ObjectEventHandlers>,
}

impl ScriptEventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handlers_mut(&mut self, object_uid: Uid) -> &mut ObjectEventHandlers {
        self.handlers.entry(object_uid).or_default()
    }

    pub fn remove(&mut self, object_uid: Uid) {
        self.handlers.remove(&object_uid);
    }

    pub fn fire_user_moved_near_to(&mut self, object_uid: Uid) {
        if let Some(h) = self.handlers.get_mut(&object_uid) {
            h.fire_user_moved_near_to(object_uid);
        }
    }

    pub fn fire_user_moved_away_from(&mut self, object_uid: Uid) {
        if let Some(h) = self.handlers.get_mut(&object_uid) {
            h.fire_user_moved_away_from(object_uid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Mutex<Vec<String>>);
    impl ScriptEvaluator for Recorder {
        fn call(&self, fn_ref: &str, _object_uid: Uid) {
            self.0.lock().unwrap().push(fn_ref.to_string());
        }
    }

    #[test]
    fn handler_runs_while_evaluator_is_alive() {
        let mut handlers = ObjectEventHandlers::default();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        handlers
            .on_user_touched
            .push(HandlerEntry::new(Arc::downgrade(&recorder) as Weak<dyn ScriptEvaluator>, "onTouch"));

        handlers.fire_user_touched(Uid(1));
        assert_eq!(recorder.0.lock().unwrap().as_slice(), ["onTouch"]);
    }

    #[test]
    fn dropped_evaluator_is_swap_removed_not_called() {
        let mut handlers = ObjectEventHandlers::default();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        handlers
            .on_user_touched
            .push(HandlerEntry::new(Arc::downgrade(&recorder) as Weak<dyn ScriptEvaluator>, "onTouch"));
        drop(recorder);

        handlers.fire_user_touched(Uid(1));
        assert!(handlers.on_user_touched.is_empty());
    }
}
