//! # Commands
//!
//! A command inspects a transaction's state and, when applicable, adds to
//! the transaction. Running a command without a dispatcher is a dry run.
//!
//! Any `Fn(&mut Transaction) -> Result<bool, CommandError>` is a command,
//! so plain functions and closures can be passed wherever one is expected:
//!
//! ```rust,ignore
//! fn select_everything(tr: &mut Transaction) -> Result<bool, CommandError> {
//!     let size = tr.doc().content().size();
//!     tr.set_selection(Selection::text(0, size).clamp(tr.doc()));
//!     Ok(true)
//! }
//!
//! select_everything.run(&state, Some(&mut |tr: Transaction| pending.push(tr)));
//! ```
//!
//! ## Contract
//!
//! `apply` returns `Ok(false)` only before touching the transaction. An
//! `Err` means the command turned out not to apply; whoever called it
//! discards the transaction.

use crate::error::CommandError;
use crate::state::EditorState;
use crate::transaction::{meta, Transaction};
use tracing::debug;

/// Receives the transaction a command built
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

pub trait Command {
    fn apply(&self, tr: &mut Transaction) -> Result<bool, CommandError>;

    /// Typing commands keep the undo group open so keystrokes coalesce
    fn is_typing(&self) -> bool {
        false
    }

    /// Builds a transaction on `state` and hands it to `dispatch`. Returns
    /// whether the command applies.
    fn run(&self, state: &EditorState, dispatch: Option<Dispatch<'_>>) -> bool {
        let mut tr = state.transaction();
        if !self.is_typing() {
            tr.set_meta(meta::CLOSE_HISTORY, true);
        }
        match self.apply(&mut tr) {
            Ok(true) => {
                if let Some(error) = tr.failed() {
                    debug!(error = %error, "Command built a failed transaction");
                    return false;
                }
                if let Some(dispatch) = dispatch {
                    dispatch(tr);
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!(error = %e, "Command not applicable");
                false
            }
        }
    }
}

impl<F> Command for F
where
    F: Fn(&mut Transaction) -> Result<bool, CommandError>,
{
    fn apply(&self, tr: &mut Transaction) -> Result<bool, CommandError> {
        self(tr)
    }
}

/// Marks a command as typing
pub struct Typing<C>(pub C);

impl<C: Command> Command for Typing<C> {
    fn apply(&self, tr: &mut Transaction) -> Result<bool, CommandError> {
        self.0.apply(tr)
    }

    fn is_typing(&self) -> bool {
        true
    }
}

/// Applies every command to the same transaction
pub struct Sequence(Vec<Box<dyn Command>>);

pub fn sequence(commands: Vec<Box<dyn Command>>) -> Sequence {
    Sequence(commands)
}

impl Command for Sequence {
    fn apply(&self, tr: &mut Transaction) -> Result<bool, CommandError> {
        let mut applied = false;
        for command in &self.0 {
            applied |= command.apply(tr)?;
        }
        Ok(applied)
    }

    fn is_typing(&self) -> bool {
        self.0.iter().all(|c| c.is_typing())
    }
}

/// Applies the first command that succeeds
pub struct FirstOf(Vec<Box<dyn Command>>);

pub fn first_of(commands: Vec<Box<dyn Command>>) -> FirstOf {
    FirstOf(commands)
}

impl Command for FirstOf {
    fn apply(&self, tr: &mut Transaction) -> Result<bool, CommandError> {
        for command in &self.0 {
            let mut attempt = tr.clone();
            match command.apply(&mut attempt) {
                Ok(true) => {
                    *tr = attempt;
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => debug!(error = %e, "Skipping command"),
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use crate::state::StateConfig;
    use quire_model::builders::*;

    fn state() -> EditorState {
        EditorState::create(StateConfig::new(doc(vec![p(vec![txt("ab")])])))
    }

    fn type_x(tr: &mut Transaction) -> Result<bool, CommandError> {
        tr.insert_text("x")?;
        Ok(true)
    }

    fn never(_tr: &mut Transaction) -> Result<bool, CommandError> {
        Ok(false)
    }

    fn broken(tr: &mut Transaction) -> Result<bool, CommandError> {
        tr.insert_text("partial")?;
        Err(CommandError::InvalidArgument("broken".into()))
    }

    #[test]
    fn test_dry_run_does_not_dispatch() {
        let state = state();
        assert!(type_x.run(&state, None));
        assert!(!never.run(&state, None));
    }

    #[test]
    fn test_run_dispatches_and_closes_history() {
        let state = state();
        let mut dispatched = Vec::new();
        assert!(type_x.run(&state, Some(&mut |tr: Transaction| dispatched.push(tr))));
        assert_eq!(dispatched.len(), 1);
        assert!(dispatched[0].meta_bool(meta::CLOSE_HISTORY));

        let mut typed = Vec::new();
        assert!(Typing(type_x).run(&state, Some(&mut |tr: Transaction| typed.push(tr))));
        assert!(!typed[0].meta_bool(meta::CLOSE_HISTORY));
    }

    #[test]
    fn test_error_is_not_applicable() {
        let state = state();
        let mut dispatched = 0;
        assert!(!broken.run(&state, Some(&mut |_: Transaction| dispatched += 1)));
        assert_eq!(dispatched, 0);
    }

    #[test]
    fn test_first_of_discards_failed_attempts() {
        let state = state();
        let command = first_of(vec![Box::new(never), Box::new(broken), Box::new(type_x)]);
        let mut tr = state.transaction();
        assert!(command.apply(&mut tr).unwrap());
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("xab")])]));
    }

    #[test]
    fn test_sequence_shares_one_transaction() {
        let state = state();
        let select_end = |tr: &mut Transaction| -> Result<bool, CommandError> {
            tr.set_selection(Selection::cursor(4));
            Ok(true)
        };
        let command = sequence(vec![Box::new(type_x), Box::new(select_end), Box::new(type_x)]);
        let mut tr = state.transaction();
        assert!(command.apply(&mut tr).unwrap());
        assert_eq!(tr.doc(), &doc(vec![p(vec![txt("xabx")])]));
        assert_eq!(tr.steps().len(), 2);
    }
}
