//! Work items handed to the dispatcher.

use serde::{Deserialize, Serialize};

/// One unit of work, tagged with its position in the source batch.
///
/// Items are immutable once produced; the dispatcher only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem<P> {
    index: usize,
    payload: P,
}

impl<P> WorkItem<P> {
    /// Create a new WorkItem.
    pub fn new(index: usize, payload: P) -> Self {
        Self { index, payload }
    }

    /// Number every payload in source order, starting at zero.
    pub fn enumerate<I>(payloads: I) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
    {
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| Self::new(index, payload))
            .collect()
    }

    /// Zero-based index of the item in its batch.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the item and return its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}
