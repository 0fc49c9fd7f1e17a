use log::warn;

use super::navigator::Navigator;
use super::screen::ScreenHandle;
use super::{AnimPair, AnimToken, ScreenId};
use crate::error::NavResult;

pub(crate) enum Op {
    Add(ScreenHandle),
    Remove(ScreenId),
    /// Clear everything staged so far, then add
    Replace(ScreenHandle),
}

/// Batch of stack mutations, applied atomically on commit.
///
/// Building a transaction has no effect; operations apply in declared order
/// when [`Transaction::commit`] runs, or not at all.
#[must_use = "a transaction does nothing until committed"]
pub struct Transaction {
    navigator: Navigator,
    ops: Vec<Op>,
    anims: Option<AnimPair>,
}

impl Transaction {
    pub(crate) fn new(navigator: Navigator) -> Self {
        Self {
            navigator,
            ops: Vec::new(),
            anims: None,
        }
    }

    pub fn add(mut self, screen: &ScreenHandle) -> Self {
        self.ops.push(Op::Add(screen.clone()));
        self
    }

    pub fn remove(self, screen: &ScreenHandle) -> Self {
        self.remove_id(screen.id())
    }

    pub fn remove_id(mut self, id: ScreenId) -> Self {
        self.ops.push(Op::Remove(id));
        self
    }

    /// Remove every screen staged in the container, then add `screen`
    pub fn replace(mut self, screen: &ScreenHandle) -> Self {
        self.ops.push(Op::Replace(screen.clone()));
        self
    }

    pub fn set_anims(mut self, enter: AnimToken, exit: AnimToken) -> Self {
        self.anims = Some(AnimPair::new(enter, exit));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the batch. Returns false, with nothing applied, when the
    /// navigator is torn down or an operation does not fit the stack.
    /// A commit issued from a screen callback is queued and reports true.
    pub fn commit(self) -> bool {
        let container = self.navigator.container();
        match self.try_commit() {
            Ok(()) => true,
            Err(e) => {
                warn!("Commit on container {} rejected: {}", container, e);
                false
            }
        }
    }

    pub fn try_commit(self) -> NavResult<()> {
        self.navigator.submit(self.ops, self.anims)
    }
}
