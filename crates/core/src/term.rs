//! Terminal helpers: colored lines, screen clearing and timed reads.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::clock::countdown_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    LightPurple,
    Purple,
    Cyan,
    LightGray,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[91m",
            Color::Green => "\x1b[92m",
            Color::Yellow => "\x1b[93m",
            Color::LightPurple => "\x1b[94m",
            Color::Purple => "\x1b[95m",
            Color::Cyan => "\x1b[96m",
            Color::LightGray => "\x1b[97m",
        }
    }
}

const RESET: &str = "\x1b[00m";

pub fn paint(color: Color, text: impl Display) -> String {
    format!("{}{}{}", color.code(), text, RESET)
}

/// Print one colored line.
pub fn show(color: Color, text: impl Display) {
    println!("{}", paint(color, format_args!(" {}", text)));
}

pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
    std::io::stdout().flush().ok();
}

pub fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(100).collect()
}

/// Result of a (possibly timed) line read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    /// The line without its trailing newline (trimmed unless raw)
    pub text: String,
    pub timed_out: bool,
    /// Input reached end of file
    pub closed: bool,
}

impl Reply {
    fn eof() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// The user typed something before the deadline.
    pub fn answered(&self) -> bool {
        !self.timed_out && !self.text.is_empty()
    }
}

/// Line-oriented input with optional deadlines.
///
/// A reader thread forwards stdin lines over a channel so a read can give
/// up after a timeout without losing the line typed later.
pub struct Console {
    lines: Receiver<String>,
}

impl Console {
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Build a console over pre-recorded lines (scripted sessions).
    pub fn scripted<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            tx.send(line.into()).ok();
        }
        Self { lines: rx }
    }

    /// Block until a full line arrives.
    pub fn read_line(&self) -> Reply {
        match self.lines.recv() {
            Ok(line) => Reply {
                text: line.trim().to_string(),
                ..Reply::default()
            },
            Err(_) => Reply::eof(),
        }
    }

    /// Wait up to `seconds` for a line, trimmed.
    ///
    /// With `countdown`, the remaining time is shown in place every second.
    /// `seconds == 0` waits without a deadline.
    pub fn read_line_timeout(&self, seconds: u64, countdown: bool) -> Reply {
        let mut reply = self.read_raw_timeout(seconds, countdown);
        reply.text = reply.text.trim().to_string();
        reply
    }

    /// Like [`Console::read_line_timeout`] without trimming.
    pub fn read_raw_timeout(&self, seconds: u64, countdown: bool) -> Reply {
        if seconds == 0 {
            return match self.lines.recv() {
                Ok(text) => Reply {
                    text,
                    ..Reply::default()
                },
                Err(_) => Reply::eof(),
            };
        }

        let mut remaining = seconds;
        while remaining > 0 {
            if countdown {
                print!("{}\r", paint(Color::Red, countdown_label(remaining)));
                std::io::stdout().flush().ok();
            }
            match self.lines.recv_timeout(Duration::from_secs(1)) {
                Ok(text) => {
                    return Reply {
                        text,
                        ..Reply::default()
                    }
                }
                Err(RecvTimeoutError::Timeout) => remaining -= 1,
                Err(RecvTimeoutError::Disconnected) => return Reply::eof(),
            }
        }
        Reply {
            timed_out: true,
            ..Reply::default()
        }
    }
}
