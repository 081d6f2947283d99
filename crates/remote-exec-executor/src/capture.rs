//! Call-local output capture.

use std::{cell::RefCell, rc::Rc};

/// Buffer collecting everything one evaluation writes to its console.
///
/// Clones share the same buffer, so the copy handed to the interpreter and
/// the copy kept by the executor see the same text. The type is neither
/// `Send` nor `Sync`: a capture lives and dies on the thread running its call.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    buffer: Rc<RefCell<String>>,
}

impl OutputCapture {
    /// Create an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one console line: parts joined by a space, then a newline.
    pub fn write_line<I, S>(&self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buffer = self.buffer.borrow_mut();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                buffer.push(' ');
            }
            buffer.push_str(part.as_ref());
        }
        buffer.push('\n');
    }

    /// Copy of the text captured so far.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Take the captured text, leaving the buffer empty.
    #[must_use]
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }
}
