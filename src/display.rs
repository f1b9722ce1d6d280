use log::{info, warn};
use std::io::Write;

/// Where readings and alerts end up. Only called from the UI loop.
pub trait Display {
    fn set_text(&mut self, text: &str);
    fn notify(&mut self, message: &str);
}

/// Writes the current text and alerts to a terminal.
pub struct ConsoleDisplay<W: Write> {
    out: W,
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        ConsoleDisplay { out }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!("display write failed ({:?})", e);
        }
    }
}

impl<W: Write> Display for ConsoleDisplay<W> {
    fn set_text(&mut self, text: &str) {
        info!("display: {}", text);
        self.write_line(text);
    }

    fn notify(&mut self, message: &str) {
        info!("notification: {}", message);
        self.write_line(&format!("[!] {}", message));
    }
}
