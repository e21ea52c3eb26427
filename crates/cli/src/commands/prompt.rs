//! Terminal answers for the planner's questions.

use spoolctl_core::Spool;
use spoolctl_planner::{Decision, Prompter};
use std::io::{BufRead, Write};

/// A [`Prompter`] reading answers line by line.
///
/// End of input answers the way a user pressing `q` would.
pub struct LinePrompter<R> {
    input: R,
}

impl LinePrompter<std::io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock())
    }
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    /// Ask for a number of grams; blank keeps `default`.
    pub fn ask_grams(&mut self, question: &str, default: f64) -> Option<f64> {
        loop {
            let answer = self.read_line(&format!("{question} [{default:.1}]: "))?;
            if answer.is_empty() {
                return Some(default);
            }
            match answer.parse::<f64>() {
                Ok(grams) if grams >= 0.0 => return Some(grams),
                _ => println!("   Please enter a number of grams."),
            }
        }
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn confirm(&mut self, question: &str) -> Decision {
        match self.read_line(&format!("{question} [y/N/q]: ")) {
            None => Decision::Abort,
            Some(answer) => match answer.to_lowercase().as_str() {
                "y" | "yes" => Decision::Proceed,
                "q" | "quit" => Decision::Abort,
                _ => Decision::Skip,
            },
        }
    }

    fn relocation_target(&mut self, spool: &Spool, from: &str) -> Option<String> {
        println!("   Removing {spool} from {from}.");
        let answer = self.read_line("   Where are you putting it? (blank = nowhere): ")?;
        (!answer.is_empty()).then_some(answer)
    }

    fn wait_for_swap(&mut self, load: &Spool, slot: &str) -> Decision {
        println!("   👉 Load {load} into {slot}.");
        match self.read_line("   Press Enter when done, 's' to skip, 'q' to quit: ") {
            None => Decision::Abort,
            Some(answer) => match answer.to_lowercase().as_str() {
                "s" | "skip" => Decision::Skip,
                "q" | "quit" => Decision::Abort,
                _ => Decision::Proceed,
            },
        }
    }

    fn choose(&mut self, label: &str, items: &[String]) -> Option<usize> {
        println!("{label}:");
        for (i, item) in items.iter().enumerate() {
            println!("  {:>2}) {item}", i + 1);
        }
        loop {
            let answer = self.read_line(&format!("Choice [1-{}, q to cancel]: ", items.len()))?;
            if answer.eq_ignore_ascii_case("q") {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Some(n - 1),
                _ => println!("   Please pick a number from the list."),
            }
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}
