use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Sliding window of recently accepted `update_id`s.
///
/// Telegram redelivers an update when the webhook answer is slow or lost;
/// remembering the last few ids keeps a redelivery from producing a second
/// reply. A capacity of 0 disables the check.
pub struct RecentUpdates {
    capacity: usize,
    inner: Mutex<Window>,
}

#[derive(Default)]
struct Window {
    seen: HashSet<i64>,
    order: VecDeque<i64>,
}

impl RecentUpdates {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Window::default()),
        }
    }

    /// Remember `id`. Returns `false` when it is already in the window.
    pub fn insert(&self, id: i64) -> bool {
        if self.capacity == 0 {
            return true;
        }
        let mut w = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !w.seen.insert(id) {
            return false;
        }
        w.order.push_back(id);
        while w.order.len() > self.capacity {
            if let Some(old) = w.order.pop_front() {
                w.seen.remove(&old);
            }
        }
        true
    }

    /// Drop `id` so a redelivery is processed again.
    pub fn forget(&self, id: i64) {
        let mut w = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if w.seen.remove(&id) {
            w.order.retain(|&x| x != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_id_is_rejected() {
        let r = RecentUpdates::new(4);
        assert!(r.insert(1));
        assert!(!r.insert(1));
        assert!(r.insert(2));
    }

    #[test]
    fn oldest_id_falls_out_of_the_window() {
        let r = RecentUpdates::new(2);
        assert!(r.insert(1));
        assert!(r.insert(2));
        assert!(r.insert(3));
        assert!(r.insert(1), "1 should have been evicted");
        assert!(!r.insert(3));
    }

    #[test]
    fn forgotten_id_is_accepted_again() {
        let r = RecentUpdates::new(8);
        assert!(r.insert(5));
        r.forget(5);
        assert!(r.insert(5));
    }

    #[test]
    fn zero_capacity_disables_dedup() {
        let r = RecentUpdates::new(0);
        assert!(r.insert(1));
        assert!(r.insert(1));
    }
}
