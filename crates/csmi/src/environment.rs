//! The environment the harness owns: every process's local state, inbound message buffer and
//! active timeout, plus the consensus logic's bookkeeping.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::ConsensusLogic;

/// The harness-owned environment: `process -> (state, buffer, active timeout)`, plus the
/// auxiliary bookkeeping threaded through every transition.
///
/// Forms a tree, not a graph: no cell here ever points back into another. Evidence sets living
/// inside `bookkeeping` are by-value copies of messages, not references.
pub struct Environment<L: ConsensusLogic> {
    states: BTreeMap<L::ProcessId, L::State>,
    buffers: BTreeMap<L::ProcessId, BTreeSet<L::Message>>,
    active_timeouts: BTreeMap<L::ProcessId, Option<L::Timeout>>,
    /// The consensus logic's auxiliary bookkeeping (evidence sets, debug latches, ...).
    pub bookkeeping: L::Bookkeeping,
}

impl<L: ConsensusLogic> Environment<L> {
    /// Build the initial environment: every process gets a freshly initialized state, a buffer
    /// seeded with `initial_messages`, and no active timeout.
    pub fn initialize(
        logic: &L,
        processes: impl IntoIterator<Item = L::ProcessId>,
        initial_messages: impl IntoIterator<Item = L::Message> + Clone,
        bookkeeping: L::Bookkeeping,
    ) -> Self {
        let mut states = BTreeMap::new();
        let mut buffers = BTreeMap::new();
        let mut active_timeouts = BTreeMap::new();

        for process in processes {
            let state = logic.initialize_process(&process);
            let buffer: BTreeSet<L::Message> = initial_messages.clone().into_iter().collect();
            states.insert(process.clone(), state);
            buffers.insert(process.clone(), buffer);
            active_timeouts.insert(process, None);
        }

        Environment {
            states,
            buffers,
            active_timeouts,
            bookkeeping,
        }
    }

    /// Every process known to this environment, in a fixed (sorted) order.
    pub fn processes(&self) -> impl Iterator<Item = &L::ProcessId> {
        self.states.keys()
    }

    /// The local state of `process`.
    ///
    /// # Panics
    /// Panics if `process` is not known to this environment.
    pub fn state(&self, process: &L::ProcessId) -> &L::State {
        self.states
            .get(process)
            .expect("process not present in environment")
    }

    /// Replace the local state of `process`.
    pub fn set_state(&mut self, process: &L::ProcessId, state: L::State) {
        self.states.insert(process.clone(), state);
    }

    /// The pending messages buffered for `process`.
    pub fn buffer(&self, process: &L::ProcessId) -> &BTreeSet<L::Message> {
        self.buffers
            .get(process)
            .expect("process not present in environment")
    }

    /// The active timeout for `process`, if any.
    pub fn active_timeout(&self, process: &L::ProcessId) -> Option<&L::Timeout> {
        self.active_timeouts
            .get(process)
            .expect("process not present in environment")
            .as_ref()
    }

    /// Insert `msg` into every process's buffer, including the sender's own: a process observes
    /// its own broadcasts through the same path as everyone else's.
    pub fn broadcast(&mut self, msg: L::Message) {
        for buffer in self.buffers.values_mut() {
            buffer.insert(msg.clone());
        }
    }

    /// Insert `msg` into a single process's buffer. Used at initialization and by scenario
    /// actions that hand a Byzantine message directly to one recipient's buffer.
    pub fn insert_message(&mut self, process: &L::ProcessId, msg: L::Message) {
        self.buffers
            .get_mut(process)
            .expect("process not present in environment")
            .insert(msg);
    }

    /// Remove exactly `msg` from `process`'s buffer.
    ///
    /// # Panics
    /// Panics if `msg` is not present — the harness only calls this after establishing the
    /// precondition `msg ∈ buffer[process]`.
    pub fn remove_message(&mut self, process: &L::ProcessId, msg: &L::Message) {
        let removed = self
            .buffers
            .get_mut(process)
            .expect("process not present in environment")
            .remove(msg);
        assert!(removed, "remove_message called on an absent message");
    }

    /// Start `new` as `process`'s active timeout via `logic`'s replacement policy: if no timeout
    /// is active, `new` always wins; otherwise `logic.should_replace` decides.
    pub fn start_timeout(&mut self, logic: &L, process: &L::ProcessId, new: L::Timeout) {
        let slot = self
            .active_timeouts
            .get_mut(process)
            .expect("process not present in environment");

        match slot {
            None => *slot = Some(new),
            Some(old) if logic.should_replace(old, &new) => *slot = Some(new),
            Some(_) => {}
        }
    }

    /// Clear `process`'s active timeout, returning it if one was set.
    ///
    /// # Panics
    /// Panics if no timeout is active — the harness only calls this after establishing the
    /// precondition `active_timeouts[process] = Some(_)`.
    pub fn take_timeout(&mut self, process: &L::ProcessId) -> L::Timeout {
        self.active_timeouts
            .get_mut(process)
            .expect("process not present in environment")
            .take()
            .expect("take_timeout called with no active timeout")
    }
}
