use std::{
    cell::RefCell,
    io::{self, BufRead, Write as _},
    rc::Rc,
};

/// Trait for handling output from the `system.io` print functions.
///
/// Implement this trait to capture or redirect print output from
/// interpreted code. The default implementation `StdPrint` writes to
/// stdout.
pub trait PrintWriter {
    /// Writes one chunk of formatted output (no terminator added).
    fn stdout_write(&mut self, output: &str);

    /// Writes a single character, generally the trailing newline.
    fn stdout_push(&mut self, end: char);

    /// Reads one line of input, without the trailing newline.
    ///
    /// Only `StdPrint` actually consults stdin; capture writers return an
    /// empty line so tests never block.
    fn stdin_line(&mut self) -> String {
        String::new()
    }
}

/// Default `PrintWriter` backed by process stdout/stdin.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
    }

    fn stdout_push(&mut self, end: char) {
        let mut buffer = [0u8; 4];
        let encoded = end.encode_utf8(&mut buffer);
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(encoded.as_bytes());
        let _ = stdout.flush();
    }

    fn stdin_line(&mut self) -> String {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        line
    }
}

/// A `PrintWriter` that collects all output into a shared string buffer.
///
/// The buffer handle survives handing the writer to an interpreter, so
/// tests can read everything the program printed afterwards.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    buffer: Rc<RefCell<String>>,
}

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle onto the collected output.
    #[must_use]
    pub fn handle(&self) -> Rc<RefCell<String>> {
        Rc::clone(&self.buffer)
    }

    /// A snapshot of the collected output.
    #[must_use]
    pub fn output(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: &str) {
        self.buffer.borrow_mut().push_str(output);
    }

    fn stdout_push(&mut self, end: char) {
        self.buffer.borrow_mut().push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) {}

    fn stdout_push(&mut self, _end: char) {}
}
