use std::{fmt::Display, io::Write};

/// Line-oriented progress output (`(i/N) <action>`).
///
/// Write failures are ignored: losing a progress line must never abort an export.
pub struct Progress {
    out: Box<dyn Write + Send>,
}

impl Progress {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn line(&mut self, msg: impl Display) {
        let _ = writeln!(self.out, "{msg}");
        let _ = self.out.flush();
    }
}
