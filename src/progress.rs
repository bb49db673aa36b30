use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

const MAX_LOG_LINES: usize = 50;

pub const DEBUG_ENV: &str = "BONICK_DEBUG";

macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::progress::debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Info,
    Http,
    Error,
}

impl Kind {
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Info => "info",
            Kind::Http => "http",
            Kind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub text: String,
    pub kind: Kind,
}

static OPERATOR_LOG: Lazy<Mutex<VecDeque<Entry>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

pub fn log<T: Into<String>>(line: T) {
    log_with(Kind::Info, line);
}

pub fn error<T: Into<String>>(line: T) {
    log_with(Kind::Error, line);
}

/// Records a line in the operator ring and mirrors it to stderr.
///
/// `Http` lines are request traces and only reach stderr when `BONICK_DEBUG` is set.
pub fn log_with<T: Into<String>>(kind: Kind, line: T) {
    let s = line.into();

    match kind {
        Kind::Http => debug_eprintln!("[{}] {}", kind.tag(), s),
        _ => eprintln!("[{}] {}", kind.tag(), s),
    }

    if let Ok(mut buf) = OPERATOR_LOG.lock() {
        if buf.len() >= MAX_LOG_LINES { buf.pop_front(); }
        buf.push_back(Entry { text: s, kind });
    }
}

pub fn recent(n: usize) -> Vec<Entry> {
    if let Ok(buf) = OPERATOR_LOG.lock() {
        let len = buf.len();
        let take = n.min(len);
        buf.iter().skip(len - take).cloned().collect()
    } else {
        Vec::new()
    }
}

pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV).is_ok()
}
