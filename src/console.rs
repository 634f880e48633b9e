//! Operator interaction during migration.
//!
//! The pipeline never reads a terminal itself. It asks a [`Console`], so the
//! same steps run under a real prompt, unattended, or in tests.

use std::io::{BufRead, Stderr, Write};

use crate::{changelog::ChangelogNotice, error::Error};

/// Which administration build(s) to keep after the 2.0.0 upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminChoice {
    /// Keep `admin`, drop `vi`.
    #[default]
    AdminOnly,
    /// Keep `vi`, drop `admin`.
    ViOnly,
    Both,
}

impl AdminChoice {
    fn from_answer(answer: &str) -> Option<Self> {
        match answer {
            "yes" => Some(AdminChoice::AdminOnly),
            "no" => Some(AdminChoice::ViOnly),
            "keep" => Some(AdminChoice::Both),
            _ => None,
        }
    }
}

pub trait Console {
    /// Presents release notes. First-time notices wait for acknowledgement.
    fn show_changelog(&mut self, notice: &ChangelogNotice) -> Result<(), Error>;

    fn choose_admin(&mut self) -> Result<AdminChoice, Error>;
}

/// Line-based prompt over any reader/writer pair.
///
/// The terminal prompt writes to stderr; stdout is reserved for command
/// output such as printed profiles.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<std::io::StdinLock<'static>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Reads one trimmed, lowercased answer. `None` at end of input.
    fn answer(&mut self, question: &str) -> Result<Option<String>, Error> {
        write!(self.output, "{question} ").map_err(Error::Prompt)?;
        self.output.flush().map_err(Error::Prompt)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(Error::Prompt)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_lowercase()))
    }
}

impl<R: BufRead, W: Write> Console for Prompt<R, W> {
    fn show_changelog(&mut self, notice: &ChangelogNotice) -> Result<(), Error> {
        write_notice(&mut self.output, notice)?;
        if matches!(notice, ChangelogNotice::Latest { .. }) {
            // any answer, including end of input, counts as acknowledged
            self.answer("Done? [Y/n]")?;
        }
        Ok(())
    }

    fn choose_admin(&mut self) -> Result<AdminChoice, Error> {
        loop {
            let Some(answer) =
                self.answer("Do you want to enforce use of admin only? (yes/no/keep) [yes]:")?
            else {
                return Ok(AdminChoice::default());
            };
            if answer.is_empty() {
                return Ok(AdminChoice::default());
            }
            if let Some(choice) = AdminChoice::from_answer(&answer) {
                return Ok(choice);
            }
            writeln!(self.output, "Error: {answer:?} is not one of yes, no, keep.")
                .map_err(Error::Prompt)?;
        }
    }
}

/// Non-interactive console: prints notices and answers with a fixed choice.
pub struct Unattended<W> {
    choice: AdminChoice,
    output: W,
}

impl<W: Write> Unattended<W> {
    pub fn new(choice: AdminChoice, output: W) -> Self {
        Self { choice, output }
    }
}

impl<W: Write> Console for Unattended<W> {
    fn show_changelog(&mut self, notice: &ChangelogNotice) -> Result<(), Error> {
        write_notice(&mut self.output, notice)
    }

    fn choose_admin(&mut self) -> Result<AdminChoice, Error> {
        Ok(self.choice)
    }
}

fn write_notice(output: &mut dyn Write, notice: &ChangelogNotice) -> Result<(), Error> {
    let lines = match notice {
        ChangelogNotice::Latest { lines } => {
            writeln!(
                output,
                "It seems you have updated your tool! Please consider reading the changelog:"
            )
            .map_err(Error::Prompt)?;
            lines
        }
        ChangelogNotice::Changes { previous, lines } => {
            writeln!(output, "Changes since {previous}:").map_err(Error::Prompt)?;
            lines
        }
    };
    for line in lines {
        writeln!(output, "{line}").map_err(Error::Prompt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn empty_answer_takes_default() {
        assert_eq!(prompt("\n").choose_admin().expect("answer"), AdminChoice::AdminOnly);
    }

    #[test]
    fn end_of_input_takes_default() {
        assert_eq!(prompt("").choose_admin().expect("answer"), AdminChoice::AdminOnly);
    }

    #[test]
    fn invalid_answer_is_asked_again() {
        let mut console = prompt("maybe\n  KEEP \n");
        assert_eq!(console.choose_admin().expect("answer"), AdminChoice::Both);

        let output = String::from_utf8(console.into_output()).expect("utf-8");
        assert!(output.contains("\"maybe\" is not one of yes, no, keep"));
    }

    #[test]
    fn no_keeps_vi() {
        assert_eq!(prompt("no\n").choose_admin().expect("answer"), AdminChoice::ViOnly);
    }

    #[test]
    fn terminal_prompt_writes_to_stderr() {
        let console: Prompt<_, std::io::Stderr> = Prompt::stdio();
        drop(console);
    }

    #[test]
    fn latest_notice_waits_for_acknowledgement() {
        let mut console = prompt("\n");
        console
            .show_changelog(&ChangelogNotice::Latest {
                lines: vec!["# Changelog".to_string()],
            })
            .expect("show");

        let output = String::from_utf8(console.into_output()).expect("utf-8");
        assert!(output.contains("# Changelog\n"));
        assert!(output.ends_with("Done? [Y/n] "));
    }
}
