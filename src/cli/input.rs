use anyhow::{Context, Result};
use std::{fmt::Display, io::Write, str::FromStr};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::SessionError;

/// Line-oriented prompts over any async reader.
///
/// Every prompt returns `Ok(None)` once input is closed so callers can wind
/// down instead of looping forever.
pub struct Prompter<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").context("failed to write to terminal")
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{text}").context("failed to write to terminal")?;
        self.out.flush().context("failed to flush terminal")
    }

    pub async fn line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.print(prompt)?;
        self.lines
            .next_line()
            .await
            .context("failed to read input")
    }

    /// Re-prompts until a non-blank line is entered.
    pub async fn text(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            let Some(line) = self.line(prompt).await? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
            self.say("Value must not be empty.")?;
        }
    }

    /// Re-prompts until an integer of at least `min` is entered.
    pub async fn number<T>(&mut self, prompt: &str, min: T) -> Result<Option<T>>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let Some(line) = self.line(prompt).await? else {
                return Ok(None);
            };
            match parse_min(&line, min) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => self.say(&err.to_string())?,
            }
        }
    }

    pub async fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        Ok(self
            .line(prompt)
            .await?
            .map(|answer| answer.trim().eq_ignore_ascii_case("y")))
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }
}

pub fn parse_min<T>(input: &str, min: T) -> Result<T, SessionError>
where
    T: FromStr + PartialOrd + Display,
{
    let value: T = input
        .trim()
        .parse()
        .map_err(|_| SessionError::Validation("please enter a whole number".into()))?;
    if value < min {
        return Err(SessionError::Validation(format!(
            "please enter a number of at least {min}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompter(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn parse_min_validates_range_and_format() {
        assert_eq!(parse_min(" 25 ", 1), Ok(25));
        assert!(matches!(parse_min("0", 1), Err(SessionError::Validation(_))));
        assert!(matches!(parse_min("-3", 1), Err(SessionError::Validation(_))));
        assert!(matches!(parse_min("ten", 1), Err(SessionError::Validation(_))));
    }

    #[test]
    fn parse_min_follows_the_target_width() {
        assert_eq!(parse_min("4294967296", 1u64), Ok(4_294_967_296));
        assert!(matches!(
            parse_min("4294967296", 1u32),
            Err(SessionError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn number_reprompts_until_valid() {
        let mut prompter = prompter("abc\n0\n7\n");
        assert_eq!(prompter.number("Rounds: ", 1).await.unwrap(), Some(7));

        let output = String::from_utf8(prompter.output().clone()).unwrap();
        assert_eq!(output.matches("Rounds: ").count(), 3);
        assert!(output.contains("whole number"));
        assert!(output.contains("at least 1"));
    }

    #[tokio::test]
    async fn text_skips_blank_lines() {
        let mut prompter = prompter("   \n  Deep work \n");
        assert_eq!(
            prompter.text("Title: ").await.unwrap().as_deref(),
            Some("Deep work")
        );
    }

    #[tokio::test]
    async fn closed_input_yields_none() {
        let mut prompter = prompter("");
        assert_eq!(prompter.number("Rounds: ", 1).await.unwrap(), None);
        assert_eq!(prompter.confirm("Sure? ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn confirm_accepts_only_y() {
        let mut prompter = prompter("Y\nyes\n");
        assert_eq!(prompter.confirm("? ").await.unwrap(), Some(true));
        assert_eq!(prompter.confirm("? ").await.unwrap(), Some(false));
    }
}
