use floodwatch_shared::GestureKind;

/// Handle returned by a [`GestureSource`] for one subscribed handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The map widget's event registry, as seen by the core.
pub trait GestureSource {
    fn subscribe(&mut self, kind: GestureKind) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);
}

/// The handlers one controller holds on a source. Every subscription made
/// through [`Subscriptions::attach`] is released by [`Subscriptions::detach`].
#[derive(Debug, Default)]
pub struct Subscriptions {
    held: Vec<(GestureKind, ListenerId)>,
}

impl Subscriptions {
    /// Subscribe to every gesture kind. No-op if already attached.
    pub fn attach<S: GestureSource + ?Sized>(&mut self, source: &mut S) -> usize {
        if !self.held.is_empty() {
            return 0;
        }
        for kind in GestureKind::ALL {
            let id = source.subscribe(kind);
            self.held.push((kind, id));
        }
        self.held.len()
    }

    /// Unsubscribe everything; returns how many handlers were released.
    pub fn detach<S: GestureSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let released = self.held.len();
        for (_, id) in self.held.drain(..) {
            source.unsubscribe(id);
        }
        released
    }

    pub fn is_attached(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// In-memory [`GestureSource`] that tracks live handlers. Used by the replay
/// tool and tests in place of a real widget.
#[derive(Debug, Default)]
pub struct RecordingSource {
    next_id: u64,
    live: Vec<(GestureKind, ListenerId)>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_subscribed(&self, kind: GestureKind) -> bool {
        self.live.iter().any(|(k, _)| *k == kind)
    }
}

impl GestureSource for RecordingSource {
    fn subscribe(&mut self, kind: GestureKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.live.push((kind, id));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.live.retain(|(_, live)| *live != id);
    }
}
