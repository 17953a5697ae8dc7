use std::collections::HashMap;
use std::hash::Hash;

/// Keyed slots holding at most one live timer each.
///
/// Handles are expected to cancel themselves on drop, so replacing or
/// clearing a slot is all it takes to cancel the previous timer.
#[derive(Debug)]
pub struct TimerSlots<K, T> {
    slots: HashMap<K, (u64, T)>,
    next_token: u64,
}

impl<K, T> Default for TimerSlots<K, T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next_token: 1,
        }
    }
}

impl<K: Eq + Hash, T> TimerSlots<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `timer` under `key`, dropping whatever was there. The returned
    /// token identifies this particular timer for [`TimerSlots::complete`].
    pub fn replace(&mut self, key: K, timer: T) -> u64 {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.slots.insert(key, (token, timer));
        token
    }

    /// Removes the slot when its timer fires, provided it was not replaced
    /// in the meantime. Returns whether `token` was still live.
    pub fn complete(&mut self, key: &K, token: u64) -> bool {
        match self.slots.get(key) {
            Some((live, _)) if *live == token => {
                self.slots.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self, key: &K) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }
}

/// Coalesces bursts of requests into a single pending frame.
#[derive(Debug, Default)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// Returns `true` when the caller has to schedule a frame; `false` when
    /// one is already queued and will pick this request up.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn begin_frame(&mut self) {
        self.pending = false;
    }
}
