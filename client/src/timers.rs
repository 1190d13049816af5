/// The delayed callbacks the viewport controller relies on. At most one
/// timer of each kind is pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Quiet period after a pan or click ends.
    GestureQuiet,
    /// Grace period after a zoom gesture ends.
    ZoomSettle,
    /// End of a programmatic camera animation.
    MoveSettle,
    /// Debounce window for forced navigation.
    NavigationWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    kind: TimerKind,
    due_ms: f64,
    order: u64,
}

/// A fired timer: its kind and the instant it was due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    pub kind: TimerKind,
    pub due_ms: f64,
}

/// Cancellable deadlines on a caller-driven millisecond clock.
///
/// Scheduling a kind that is already pending replaces it in the same call, so
/// there is never a moment where both the old and the new deadline exist, and
/// a replaced timer can never fire.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_order: u64,
    pending: Vec<Pending>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay_ms` after `now_ms`, replacing any pending timer of that kind.
    pub fn schedule(&mut self, kind: TimerKind, now_ms: f64, delay_ms: f64) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        let due_ms = now_ms + delay_ms.max(0.0);
        match self.pending.iter_mut().find(|p| p.kind == kind) {
            Some(slot) => {
                slot.due_ms = due_ms;
                slot.order = order;
            }
            None => self.pending.push(Pending {
                kind,
                due_ms,
                order,
            }),
        }
    }

    /// Returns whether a timer of `kind` was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.kind != kind);
        self.pending.len() != before
    }

    /// Cancel everything; returns how many timers were pending.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|p| p.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.iter().map(|p| p.due_ms).reduce(f64::min)
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    /// Timers due at the same instant fire in the order they were scheduled.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Fired> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .total_cmp(&b.due_ms)
                    .then_with(|| a.order.cmp(&b.order))
            })
            .map(|(i, _)| i)?;
        let p = self.pending.swap_remove(idx);
        Some(Fired {
            kind: p.kind,
            due_ms: p.due_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_when_due() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::GestureQuiet, 0.0, 100.0);
        assert_eq!(timers.pop_due(99.0), None);
        assert_eq!(
            timers.pop_due(100.0),
            Some(Fired {
                kind: TimerKind::GestureQuiet,
                due_ms: 100.0
            })
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn rescheduling_replaces_the_pending_timer() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::GestureQuiet, 0.0, 100.0);
        timers.schedule(TimerKind::GestureQuiet, 80.0, 100.0);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(150.0), None);
        assert_eq!(timers.next_deadline(), Some(180.0));
        assert!(timers.pop_due(180.0).is_some());
        assert_eq!(timers.pop_due(1_000.0), None);
    }

    #[test]
    fn fires_earliest_first_then_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::ZoomSettle, 0.0, 300.0);
        timers.schedule(TimerKind::MoveSettle, 0.0, 100.0);
        timers.schedule(TimerKind::GestureQuiet, 0.0, 100.0);
        let order: Vec<TimerKind> = std::iter::from_fn(|| timers.pop_due(500.0))
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            order,
            vec![
                TimerKind::MoveSettle,
                TimerKind::GestureQuiet,
                TimerKind::ZoomSettle
            ]
        );
    }

    #[test]
    fn cancel_reports_whether_anything_was_pending() {
        let mut timers = TimerQueue::new();
        assert!(!timers.cancel(TimerKind::ZoomSettle));
        timers.schedule(TimerKind::ZoomSettle, 0.0, 10.0);
        timers.schedule(TimerKind::NavigationWindow, 0.0, 10.0);
        assert!(timers.cancel(TimerKind::ZoomSettle));
        assert!(!timers.is_pending(TimerKind::ZoomSettle));
        assert_eq!(timers.cancel_all(), 1);
        assert_eq!(timers.next_deadline(), None);
    }
}
