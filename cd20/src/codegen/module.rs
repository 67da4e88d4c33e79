//! Text sections of an SM20 module file.
//!
//! Every section is a count line followed by its body. Word filled
//! sections count output lines, line sections count values.
use std::fmt::{self, Write as FmtWrite};

use super::Operation;
use crate::constants::WORD_LINE;

/// A finished section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub count: usize,
    pub body: String,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.count)?;
        if !self.body.is_empty() {
            write!(f, "\n{}", self.body)?;
        }
        Ok(())
    }
}

/// Bytes written as zero padded decimal cells, a word per line.
///
/// The last line is padded with `HALT` bytes.
#[derive(Debug, Default)]
pub struct WordFilled {
    lines: usize,
    /// Cells written on the current line.
    cells: usize,
    body: String,
}

impl WordFilled {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> fmt::Result {
        if self.lines == 0 {
            self.lines = 1;
        } else if self.cells == WORD_LINE {
            self.body.push('\n');
            self.cells = 0;
            self.lines += 1;
        }

        write!(self.body, "{:>4}", format!("{:02}", byte))?;
        self.cells += 1;
        Ok(())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> fmt::Result {
        bytes.iter().try_for_each(|byte| self.push(*byte))
    }

    pub fn finish(mut self) -> Result<Section, fmt::Error> {
        if self.lines > 0 {
            while self.cells < WORD_LINE {
                self.push(Operation::Halt.code())?;
            }
        }

        Ok(Section {
            count: self.lines,
            body: self.body,
        })
    }
}

/// One value per line.
#[derive(Debug, Default)]
pub struct Lines {
    lines: Vec<String>,
}

impl Lines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl fmt::Display) {
        self.lines.push(value.to_string());
    }

    pub fn finish(self) -> Section {
        Section {
            count: self.lines.len(),
            body: self.lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_word_filled_padding() {
        let mut section = WordFilled::new();
        section.extend(&[63, 5, 255]).unwrap();
        let section = section.finish().unwrap();

        assert_eq!(section.count, 1);
        assert_eq!(section.body, "  63  05 255  00  00  00  00  00");
    }

    #[test]
    fn test_word_filled_wraps() {
        let mut section = WordFilled::new();
        section.extend(&[1; 9]).unwrap();
        let section = section.finish().unwrap();

        assert_eq!(section.count, 2);
        assert_eq!(section.body.lines().count(), 2);
        assert_eq!(section.body.lines().nth(1), Some("  01  00  00  00  00  00  00  00"));
    }

    #[test]
    fn test_exact_line_is_not_padded() {
        let mut section = WordFilled::new();
        section.extend(&[7; 8]).unwrap();
        let section = section.finish().unwrap();
        assert_eq!(section.count, 1);
    }

    #[test]
    fn test_empty_sections() {
        let words = WordFilled::new().finish().unwrap();
        assert_eq!(words.to_string(), "0");

        let lines = Lines::new().finish();
        assert_eq!(lines.to_string(), "0");
    }

    #[test]
    fn test_lines() {
        let mut section = Lines::new();
        section.push(-5);
        section.push(1.5f64);
        assert_eq!(section.finish().to_string(), "2\n-5\n1.5");
    }
}
