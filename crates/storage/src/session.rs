use eyre::{bail, Result};
use log::debug;
use model::rights::Actor;

use crate::patch::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Applying,
    Pending,
    Confirmed,
    RolledBack,
}

impl MutationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Confirmed | MutationState::RolledBack)
    }
}

/// One mutation instance: who runs it, where it is in its lifecycle and the
/// optimistic patches it holds until the network call resolves.
#[derive(Debug)]
pub struct Session {
    actor: Actor,
    state: MutationState,
    patches: Vec<Patch>,
}

impl Session {
    pub fn new(actor: Actor) -> Self {
        Session {
            actor,
            state: MutationState::Idle,
            patches: Vec::new(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.state != MutationState::Idle {
            bail!("Mutation already started: {:?}", self.state);
        }
        self.state = MutationState::Applying;
        Ok(())
    }

    /// Keeps `patch` until the mutation resolves.
    pub fn hold(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    /// Marks the end of the optimistic phase; the network call follows.
    pub fn pending(&mut self) {
        if self.state == MutationState::Applying {
            self.state = MutationState::Pending;
        }
    }

    pub fn commit(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        for patch in &mut self.patches {
            patch.discard();
        }
        self.state = MutationState::Confirmed;
        debug!("mutation confirmed, {} patch(es) discarded", self.patches.len());
    }

    pub fn rollback(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        for patch in self.patches.iter_mut().rev() {
            patch.undo();
        }
        self.state = MutationState::RolledBack;
        debug!("mutation rolled back, {} patch(es) undone", self.patches.len());
    }
}
