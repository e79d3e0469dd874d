use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Shared sample ring between the decoder thread and the audio output.
/// Writers never block: once full, the oldest samples are discarded.
pub struct SampleRing<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Copy> SampleRing<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        })
    }

    pub fn push_slice(&self, items: &[T]) {
        let mut buf = self.inner.lock();
        // Only the newest `capacity` items can survive.
        let items = &items[items.len().saturating_sub(self.capacity)..];
        let overflow = (buf.len() + items.len()).saturating_sub(self.capacity);
        buf.drain(..overflow);
        buf.extend(items.iter().copied());
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_push_order() {
        let ring = SampleRing::new(8);
        ring.push_slice(&[1.0f32, 2.0, 3.0]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.try_pop(), Some(1.0));
        assert_eq!(ring.try_pop(), Some(2.0));
        assert_eq!(ring.try_pop(), Some(3.0));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn full_ring_drops_oldest() {
        let ring = SampleRing::new(4);
        ring.push_slice(&[1, 2, 3]);
        ring.push_slice(&[4, 5, 6]);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.try_pop(), Some(3));
        assert_eq!(ring.try_pop(), Some(4));
    }

    #[test]
    fn oversized_push_keeps_the_tail() {
        let ring = SampleRing::new(3);
        ring.push_slice(&[1, 2, 3, 4, 5]);
        let drained: Vec<_> = std::iter::from_fn(|| ring.try_pop()).collect();
        assert_eq!(drained, vec![3, 4, 5]);
    }

    #[test]
    fn clear_empties() {
        let ring = SampleRing::new(4);
        ring.push_slice(&[1, 2]);
        ring.clear();
        assert!(ring.is_empty());
    }
}
