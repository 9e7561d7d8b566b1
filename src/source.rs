use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::error::{Result, SurveyError};

/// A forward-only stream of text lines, such as a utility's stdout.
pub trait LineSource {
    /// Returns the next line without its terminator, or `None` at end of stream.
    fn next_line(&mut self) -> Result<Option<String>>;
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> Result<Option<String>> {
        (**self).next_line()
    }
}

/// Lines held in memory, used for fixtures and already captured output.
#[derive(Debug, Clone, Default)]
pub struct CannedLines {
    lines: std::vec::IntoIter<String>,
}

impl CannedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect::<Vec<_>>().into_iter(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }
}

impl LineSource for CannedLines {
    fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next())
    }
}

/// Lines of any buffered byte stream.
///
/// Bytes that are not UTF-8 are replaced rather than rejected, so a single
/// odd hostname reaches the parser as a line it can judge on its own.
pub struct ReaderLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

/// Stdout of a spawned utility, read line by line as it is produced.
pub struct CommandLines {
    program: String,
    child: Child,
    lines: ReaderLines<BufReader<ChildStdout>>,
    finished: bool,
}

impl CommandLines {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        log::debug!("spawning {program} {}", args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SurveyError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SurveyError::Spawn {
            program: program.to_string(),
            source: std::io::Error::other("stdout was not captured"),
        })?;

        Ok(Self {
            program: program.to_string(),
            child,
            lines: ReaderLines::new(BufReader::new(stdout)),
            finished: false,
        })
    }

    /// The local neighbor table, `arp -a`.
    pub fn arp_table() -> Result<Self> {
        Self::spawn("arp", &["-a".to_string()])
    }

    /// An echo test of `count` probes, `ping -c <count> <target>`.
    pub fn echo_test(target: &str, count: u16) -> Result<Self> {
        Self::spawn("ping", &["-c".to_string(), count.to_string(), target.to_string()])
    }

    fn reap(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        if !status.success() {
            // ping exits non-zero when replies are missing; the parser judges the output
            log::warn!("{} exited with {status}", self.program);
        }
        Ok(())
    }
}

impl LineSource for CommandLines {
    fn next_line(&mut self) -> Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        match self.lines.next_line()? {
            Some(line) => Ok(Some(line)),
            None => {
                self.reap()?;
                Ok(None)
            }
        }
    }
}

impl Drop for CommandLines {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
