//! The confirmation seam between the planner and whoever answers its questions.

use spoolctl_core::spool::Spool;
use std::collections::VecDeque;

/// Answer to a blocking question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    /// Decline; skip the current requirement
    Skip,
    /// Stop the whole session
    Abort,
}

/// Interactive surface used by the planner.
///
/// Every call blocks until answered. Messages passed to `notify` are the
/// inline warnings and instructions shown while requirements are processed.
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&mut self, question: &str) -> Decision;

    /// Where the spool taken out of `from` went. `None` leaves it unplaced.
    fn relocation_target(&mut self, spool: &Spool, from: &str) -> Option<String>;

    /// Block until the user has physically swapped `load` into `slot`.
    fn wait_for_swap(&mut self, load: &Spool, slot: &str) -> Decision;

    /// Pick one of `items`. `None` aborts.
    fn choose(&mut self, label: &str, items: &[String]) -> Option<usize>;

    fn notify(&mut self, message: &str);
}

/// A [`Prompter`] that replays queued answers and records what it was told.
///
/// When a queue runs dry: `confirm` skips, `wait_for_swap` proceeds,
/// `relocation_target` answers `None`, `choose` aborts.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    pub confirms: VecDeque<Decision>,
    pub relocations: VecDeque<Option<String>>,
    pub swaps: VecDeque<Decision>,
    pub choices: VecDeque<Option<usize>>,
    pub questions: Vec<String>,
    pub messages: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, decision: Decision) -> Self {
        self.confirms.push_back(decision);
        self
    }

    pub fn relocate_to(mut self, target: Option<&str>) -> Self {
        self.relocations.push_back(target.map(str::to_string));
        self
    }

    pub fn swap_with(mut self, decision: Decision) -> Self {
        self.swaps.push_back(decision);
        self
    }

    pub fn choose_index(mut self, index: Option<usize>) -> Self {
        self.choices.push_back(index);
        self
    }

    /// Whether any notification contains `needle`.
    pub fn was_told(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> Decision {
        self.questions.push(question.to_string());
        self.confirms.pop_front().unwrap_or(Decision::Skip)
    }

    fn relocation_target(&mut self, spool: &Spool, from: &str) -> Option<String> {
        self.questions
            .push(format!("relocate #{} from {from}", spool.id));
        self.relocations.pop_front().flatten()
    }

    fn wait_for_swap(&mut self, load: &Spool, slot: &str) -> Decision {
        self.questions.push(format!("load #{} into {slot}", load.id));
        self.swaps.pop_front().unwrap_or(Decision::Proceed)
    }

    fn choose(&mut self, label: &str, items: &[String]) -> Option<usize> {
        self.questions.push(format!("{label} ({} items)", items.len()));
        self.choices
            .pop_front()
            .flatten()
            .filter(|i| *i < items.len())
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
