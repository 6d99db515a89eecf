//! Destination of `print`, `ls` and other user-visible output.
//!
//! Hosts pick stdout; tests and embedders capture into a buffer; batch
//! runs can silence output entirely. Enum dispatch keeps the hot `print`
//! path free of vtable calls.

use std::sync::Arc;

use parking_lot::Mutex;

/// Where printed output goes.
pub enum PrintHandlerImpl {
    /// Write to the process's stdout.
    Stdout,
    /// Accumulate in memory until taken.
    Buffer(Mutex<String>),
    /// Discard.
    Silent,
}

impl PrintHandlerImpl {
    /// Emit `msg` followed by a newline.
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(msg);
                buffer.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Emit `msg` as is.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(buffer) => buffer.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Everything captured so far. Empty unless this is a buffer.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buffer) => buffer.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Return the captured output and clear the buffer.
    pub fn take_output(&self) -> String {
        match self {
            Self::Buffer(buffer) => std::mem::take(&mut *buffer.lock()),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Buffer(_))
    }
}

/// Print handler shared by a session and every node it creates.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
