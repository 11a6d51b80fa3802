use core::fmt::Write;

use log::{Level, LevelFilter, Metadata, Record};

use crate::console::CONSOLE;

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut lock = CONSOLE.lock();

            writeln!(&mut lock, "[{}:{}] {}", record.level(), record.target(), record.args()).ok();

            if record.metadata().level() <= Level::Error {
                lock.flush();
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Installs the console logger. Later calls are no-ops.
pub fn register_global_logger() {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Debug)).ok();
}
