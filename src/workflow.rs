//! Explicit finite-state machines for record lifecycles.
//!
//! Each record status enum declares a closed transition table: for every action,
//! the statuses it may start from and the status it leads to. Field-level guards
//! (required notes, completed children, checklists) are checked by the record
//! itself; the table only answers whether the action is legal from here.

use std::fmt::Debug;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Transition<S: 'static, A: 'static> {
    pub action: A,
    pub from: &'static [S],
    pub to: S,
}

pub trait Lifecycle: Copy + Eq + Debug + 'static {
    type Action: Copy + Eq + Debug + 'static;

    const TRANSITIONS: &'static [Transition<Self, Self::Action>];

    /// Status reached by running `action` from `self`.
    fn next(self, action: Self::Action) -> Result<Self> {
        Self::TRANSITIONS
            .iter()
            .find(|transition| transition.action == action && transition.from.contains(&self))
            .map(|transition| transition.to)
            .ok_or_else(|| {
                Error::guard(format!(
                    "Action {action:?} is not allowed while the record is {self:?}."
                ))
            })
    }

    fn can(self, action: Self::Action) -> bool {
        self.next(action).is_ok()
    }
}
