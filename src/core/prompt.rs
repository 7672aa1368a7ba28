//! Overwrite confirmation as a value, not as control flow.

use std::io::{self, BufRead, Write};

use crate::core::errors::{DpmError, Result};

/// Answer to a confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Cancelled,
}

/// User-interaction seam consulted before an existing document is replaced.
pub trait Confirm {
    fn confirm(&self, question: &str) -> Result<Confirmation>;
}

/// Fixed answer, used for `--force` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub Confirmation);

impl AutoConfirm {
    pub const PROCEED: Self = Self(Confirmation::Proceed);
    pub const CANCEL: Self = Self(Confirmation::Cancelled);
}

impl Confirm for AutoConfirm {
    fn confirm(&self, _question: &str) -> Result<Confirmation> {
        Ok(self.0)
    }
}

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, question: &str) -> Result<Confirmation> {
        ask(&mut io::stdin().lock(), &mut io::stderr().lock(), question)
    }
}

/// Writes `question` and reads one answer line. A closed input can never say
/// yes, so it cancels the whole command rather than this one save.
fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<Confirmation> {
    write!(output, "{question} [y/n]: ").map_err(|source| DpmError::io("<stderr>", source))?;
    output
        .flush()
        .map_err(|source| DpmError::io("<stderr>", source))?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .map_err(|source| DpmError::io("<stdin>", source))?;
    if read == 0 {
        return Err(DpmError::CommandCancelled);
    }
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> Confirmation {
    match answer.trim() {
        "y" | "Y" | "yes" | "YES" => Confirmation::Proceed,
        _ => Confirmation::Cancelled,
    }
}
