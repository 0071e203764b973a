/// One-character-at-a-time operator input.
///
/// `SkipWhitespace` behaves like a formatted character read: spaces, tabs and
/// newlines between keystrokes are dropped, so `1 0` and `1\n0\n` are both two
/// commands. `Raw` hands back every byte, including the newline a terminal
/// sends after each line.

use anyhow::anyhow;
use std::io::{ErrorKind, Read};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    SkipWhitespace,
    Raw,
}

impl FromStr for ReadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whitespace" | "skip-whitespace" => Ok(ReadMode::SkipWhitespace),
            "raw" => Ok(ReadMode::Raw),
            other => Err(anyhow!("READ_MODE '{}' is not supported. Use 'whitespace' or 'raw'.", other)),
        }
    }
}

pub struct KeyReader<R> {
    inner: R,
    mode: ReadMode,
}

impl<R: Read> KeyReader<R> {
    pub fn new(inner: R, mode: ReadMode) -> Self {
        Self { inner, mode }
    }

    /// Next keystroke, or `None` at end of input. Read failures also end input.
    pub fn next_key(&mut self) -> Option<char> {
        loop {
            let byte = self.next_byte()?;
            if self.mode == ReadMode::SkipWhitespace && byte.is_ascii_whitespace() {
                continue;
            }
            return Some(char::from(byte));
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return None,
                Ok(_) => return Some(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!(target: "input", "Input read failed, ending session: {}", e);
                    return None;
                }
            }
        }
    }
}

impl<R: Read> Iterator for KeyReader<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.next_key()
    }
}
