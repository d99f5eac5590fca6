//! Queue store
//!
//! Holds the pending queue (speak order) and the list of utterances pushed
//! aside by an interjection. The store only moves utterances around; firing
//! callbacks for removed entries is the scheduler's job.

use std::collections::VecDeque;

use super::utterance::{QueueMode, Utterance, UtteranceId};

#[derive(Debug, Default)]
pub struct QueueStore {
    pending: VecDeque<Utterance>,
    displaced: Vec<Utterance>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, utterance: Utterance) {
        self.pending.push_back(utterance);
    }

    pub fn front(&self) -> Option<&Utterance> {
        self.pending.front()
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut Utterance> {
        self.pending.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Utterance> {
        self.pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn displaced_len(&self) -> usize {
        self.displaced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Utterance> {
        self.pending.iter()
    }

    pub fn displaced(&self) -> impl Iterator<Item = &Utterance> {
        self.displaced.iter()
    }

    pub fn pending_ids(&self) -> Vec<UtteranceId> {
        self.pending.iter().map(Utterance::id).collect()
    }

    pub fn displaced_ids(&self) -> Vec<UtteranceId> {
        self.displaced.iter().map(Utterance::id).collect()
    }

    /// Remove every pending entry matching `predicate`, keeping the order of
    /// both the removed and the surviving entries
    pub fn remove_pending_where<P>(&mut self, mut predicate: P) -> Vec<Utterance>
    where
        P: FnMut(&Utterance) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for utterance in self.pending.drain(..) {
            if predicate(&utterance) {
                removed.push(utterance);
            } else {
                kept.push_back(utterance);
            }
        }
        self.pending = kept;
        removed
    }

    /// Make `interjection` the only pending entry
    ///
    /// The interrupted utterance (if any) goes first in the displaced list,
    /// followed by the previous pending entries, followed by anything still
    /// displaced by an earlier interjection whose restore has not run yet.
    pub fn displace_for_interjection(
        &mut self,
        interrupted: Option<Utterance>,
        interjection: Utterance,
    ) {
        let mut displaced: Vec<Utterance> =
            Vec::with_capacity(self.pending.len() + self.displaced.len() + 1);
        displaced.extend(interrupted);
        displaced.extend(self.pending.drain(..));
        displaced.append(&mut self.displaced);
        self.displaced = displaced;
        self.pending.push_back(interjection);
    }

    /// Append the displaced entries behind the pending ones and relabel the
    /// whole queue as interjections
    pub fn restore_displaced(&mut self) -> usize {
        let restored = self.displaced.len();
        self.pending.extend(self.displaced.drain(..));
        for utterance in self.pending.iter_mut() {
            utterance.queue_mode = QueueMode::Interject;
        }
        restored
    }

    pub fn drain_pending(&mut self) -> Vec<Utterance> {
        self.pending.drain(..).collect()
    }

    pub fn drain_displaced(&mut self) -> Vec<Utterance> {
        std::mem::take(&mut self.displaced)
    }
}
