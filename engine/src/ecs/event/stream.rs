//! Double-buffered event queue driving dispatch rounds.
//!
//! [`Stream`] holds two buffers:
//! - **Active buffer**: where new events are written via [`send()`](Stream::send)
//! - **Stable buffer**: the round currently being dispatched
//!
//! When [`swap()`](Stream::swap) is called at the start of a round:
//! 1. The active buffer becomes the stable buffer (its events form the new round)
//! 2. The old stable buffer is cleared and becomes the new active buffer
//!
//! Events sent while a round is being dispatched therefore land in the next round, never in the
//! one being walked.
//!
//! ```rust
//! use pivot_engine::ecs::event::Stream;
//!
//! let mut stream = Stream::new();
//! stream.send("Tick");
//! stream.swap();
//!
//! let round = stream.take_round();
//! stream.send("ChangeName");
//! assert_eq!(round, vec!["Tick"]);
//!
//! stream.swap();
//! assert_eq!(stream.take_round(), vec!["ChangeName"]);
//! ```

/// Double-buffered, unbounded event storage.
#[derive(Debug)]
pub struct Stream<E> {
    /// Index of the currently active (write) buffer: 0 or 1
    active_index: usize,

    /// The two buffers - one active, one stable
    buffers: [Vec<E>; 2],
}

impl<E> Default for Stream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Stream<E> {
    pub fn new() -> Self {
        Self {
            active_index: 0,
            buffers: [Vec::new(), Vec::new()],
        }
    }

    /// Send an event to the active buffer.
    #[inline]
    pub fn send(&mut self, event: E) {
        self.buffers[self.active_index].push(event);
    }

    /// Send several events to the active buffer, in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = E>) {
        self.buffers[self.active_index].extend(events);
    }

    /// Iterate over the stable buffer, in send order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.stable_buffer().iter()
    }

    /// Number of events in the stable buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.stable_buffer().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stable_buffer().is_empty()
    }

    /// Number of events waiting in the active buffer.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffers[self.active_index].len()
    }

    /// Swaps the active and stable buffers.
    pub fn swap(&mut self) {
        self.active_index = 1 - self.active_index;
        self.buffers[self.active_index].clear();
    }

    /// Move the stable buffer out, leaving it empty. The active buffer stays writable while the
    /// returned round is walked.
    pub fn take_round(&mut self) -> Vec<E> {
        std::mem::take(&mut self.buffers[1 - self.active_index])
    }

    #[inline]
    fn stable_buffer(&self) -> &Vec<E> {
        &self.buffers[1 - self.active_index]
    }
}
