//! Single-slot, latest-wins hand-off between the worker and the UI thread.
//!
//! Built on a capacity-1 crossbeam channel. The publisher keeps a receiver
//! clone so it can evict a value the consumer has not picked up yet.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

pub struct SlotPublisher<T> {
    tx: Sender<T>,
    evict: Receiver<T>,
}

pub struct SlotReader<T> {
    rx: Receiver<T>,
}

pub fn slot<T>() -> (SlotPublisher<T>, SlotReader<T>) {
    let (tx, rx) = bounded(1);
    (
        SlotPublisher {
            tx,
            evict: rx.clone(),
        },
        SlotReader { rx },
    )
}

impl<T> SlotPublisher<T> {
    /// Publish without blocking. Returns `true` when an unconsumed value was
    /// overwritten.
    pub fn publish(&self, value: T) -> bool {
        let mut value = value;
        let mut overwritten = false;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return overwritten,
                Err(TrySendError::Full(back)) => {
                    overwritten |= self.evict.try_recv().is_ok();
                    value = back;
                }
                Err(TrySendError::Disconnected(_)) => return overwritten,
            }
        }
    }
}

impl<T> SlotReader<T> {
    pub fn take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
