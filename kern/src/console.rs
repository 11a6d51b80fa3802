use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use spin::Mutex;

use crate::collections::CapacityRingBuffer;
use crate::param::CONSOLE_LINES;

/// Kernel message buffer. Completed lines are kept in a bounded ring so the
/// most recent output can always be retrieved.
pub struct Console {
    pending: String,
    lines: Option<CapacityRingBuffer<String>>,
}

impl Console {
    const fn new() -> Console {
        Console { pending: String::new(), lines: None }
    }

    fn lines(&mut self) -> &mut CapacityRingBuffer<String> {
        self.lines.get_or_insert_with(|| CapacityRingBuffer::new(CONSOLE_LINES))
    }

    pub fn write_byte(&mut self, byte: u8) {
        if byte == b'\n' {
            let line = core::mem::replace(&mut self.pending, String::new());
            self.lines().push_overwrite(line);
        } else {
            self.pending.push(byte as char);
        }
    }

    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.write_byte(b'\n');
        }
    }

    pub fn recent(&self) -> Vec<String> {
        match &self.lines {
            Some(lines) => lines.iter().cloned().collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for line in s.split_inclusive('\n') {
            match line.strip_suffix('\n') {
                Some(body) => {
                    self.pending.push_str(body);
                    self.write_byte(b'\n');
                }
                None => self.pending.push_str(line),
            }
        }
        Ok(())
    }
}

/// Global console singleton.
pub static CONSOLE: Mutex<Console> = Mutex::new(Console::new());

/// Returns a copy of the most recent completed console lines, oldest first.
pub fn recent_lines() -> Vec<String> {
    CONSOLE.lock().recent()
}
