//! Command-line input handling.
//!
//! Maps lines read from stdin to [`Trigger`]s.  Each line stands in for one
//! chat message:
//!
//! ```text
//! <channel> <nick> <message text>
//! #rust alice .stackexchange subscribe stackoverflow rust
//! ```
//!
//! Lines whose text isn't a `stackexchange` command are ignored.

use std::borrow::Cow;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::commands::{Command, COMMAND_NAME};

/// A command addressed to the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub channel: String,
    pub nick: String,
    /// `Err` holds the reply for an unknown subcommand.
    pub command: Result<Command, String>,
}

/// Parse one input line.  `None` when the line is incomplete or not meant
/// for us.
pub fn parse_line(line: &str, prefix: &str) -> Option<Trigger> {
    let mut words = line.split_whitespace();
    let channel = words.next()?;
    let nick = words.next()?;

    let invoked = words.next()?.strip_prefix(prefix)?;
    if !invoked.eq_ignore_ascii_case(COMMAND_NAME) {
        return None;
    }

    let args: Vec<&str> = words.collect();
    Some(Trigger {
        channel: channel.to_string(),
        nick: nick.to_string(),
        command: Command::parse(&args),
    })
}

/// Read the next line without its terminator.  Invalid UTF-8 is replaced
/// rather than treated as an error, so one bad line can't end the loop.
/// `None` at end of input.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    match String::from_utf8_lossy(&buf) {
        Cow::Borrowed(line) => Ok(Some(line.to_string())),
        Cow::Owned(line) => {
            log::warn!("Input line was not valid UTF-8; read as {:?}", line);
            Ok(Some(line))
        }
    }
}
