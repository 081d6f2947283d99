//! Local replay of remote output.

use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

/// Header printed before replayed remote stdout.
pub const STDOUT_HEADER: &str = "[REMOTE STDOUT]";
/// Header printed before a replayed remote traceback.
pub const TRACEBACK_HEADER: &str = "[REMOTE TRACEBACK]";

/// Destination for replayed remote output.
pub trait Console: Send + Sync {
    /// Emit `text` under `header`.
    fn emit(&self, header: &str, text: &str);
}

/// Writes to the process's stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn emit(&self, header: &str, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{header}");
        let _ = write!(out, "{text}");
        let _ = out.flush();
    }
}

/// Collects replayed output in memory.
#[derive(Debug, Default)]
pub struct BufferConsole {
    buffer: Mutex<String>,
}

impl BufferConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, headers included.
    #[must_use]
    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Console for BufferConsole {
    fn emit(&self, header: &str, text: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push_str(header);
        buffer.push('\n');
        buffer.push_str(text);
    }
}
