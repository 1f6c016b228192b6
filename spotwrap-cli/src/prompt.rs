// ============================================================================
// spotwrap-cli/src/prompt.rs
// ============================================================================
//
// PROMPTS: Line-Based Questions for the Interactive Menu
//
// Prompter reads answers from any BufRead and writes questions to any Write,
// so the menu can be driven by scripted input in tests. End of input is
// reported as an UnexpectedEof error, which the menu treats as "exit".
//
// KEY COMPONENTS:
// - ask / ask_required: free text with an optional default
// - ask_parsed: free text parsed into a value, re-asked until it parses
// - choose: numbered list, re-asks until a valid number is given
// - confirm: yes/no with a default
// - number: optional integer with a lower bound

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writer the questions go to, for messages between prompts.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Asks for free text. An empty answer yields the default, or an empty
    /// string when there is none.
    pub fn ask(&mut self, prompt: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(default) if !default.is_empty() => {
                write!(self.output, "{prompt} (default: {default}): ")?
            }
            _ => write!(self.output, "{prompt}: ")?,
        }
        let answer = self.read_line()?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    /// Asks until a non-empty answer is given.
    pub fn ask_required(&mut self, prompt: &str, missing: &str) -> io::Result<String> {
        loop {
            let answer = self.ask(prompt, None)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say(missing)?;
        }
    }

    /// Asks until the answer parses as `T`, printing the parse error after
    /// each rejected answer. A blank answer is handed to the parser too.
    pub fn ask_parsed<T>(&mut self, prompt: &str) -> io::Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        loop {
            let answer = self.ask(prompt, None)?;
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(e) => self.say(&format!("Invalid input: {e}"))?,
            }
        }
    }

    /// Shows a numbered list and returns the chosen index.
    pub fn choose(&mut self, prompt: &str, options: &[String], default: usize) -> io::Result<usize> {
        writeln!(self.output)?;
        writeln!(self.output, "{prompt}")?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option)?;
        }
        let default_label = (default + 1).to_string();
        loop {
            let answer = self.ask("Enter your choice (number)", Some(&default_label))?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                Ok(_) => self.say(&format!(
                    "Invalid choice. Please enter a number between 1 and {}.",
                    options.len()
                ))?,
                Err(_) => self.say("Invalid input. Please enter a whole number.")?,
            }
        }
    }

    /// Yes/no question; anything starting with y or n counts.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool> {
        let default_label = if default { "yes" } else { "no" };
        loop {
            let answer = self.ask(&format!("{prompt} (yes/no)"), Some(default_label))?;
            match answer.to_lowercase().chars().next() {
                Some('y') => return Ok(true),
                Some('n') => return Ok(false),
                _ => self.say("Please answer yes or no.")?,
            }
        }
    }

    /// Asks for a whole number of at least `min`. An empty answer yields
    /// `default`, which may be `None`.
    pub fn number(&mut self, prompt: &str, default: Option<u32>, min: u32) -> io::Result<Option<u32>> {
        let default_label = default.map(|d| d.to_string());
        loop {
            let answer = self.ask(prompt, default_label.as_deref())?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<u32>() {
                Ok(n) if n >= min => return Ok(Some(n)),
                Ok(_) => self.say(&format!(
                    "Please enter a number greater than or equal to {min}."
                ))?,
                Err(_) => self.say("Invalid input. Please enter a valid whole number.")?,
            }
        }
    }
}
