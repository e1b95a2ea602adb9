use derive_more::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

#[must_use]
pub fn enabled(level: Level) -> bool {
    level > Level::Debug || VERBOSE.load(Ordering::Relaxed)
}

///
/// Level
///

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Display)]
pub enum Level {
    Debug, // least severe
    Info,
    Ok,
    Warn,
    Error, // most severe
}

impl Level {
    // ANSI color for the label (Debug has no color)
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::Info => "\x1b[34m",
            Self::Warn => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Debug => "",
        }
    }
}

/// Render one log line without the trailing newline.
#[must_use]
pub fn format_line(level: Level, topic: Option<&str>, message: &str) -> String {
    let color = level.color();
    let reset = if color.is_empty() { "" } else { "\x1b[0m" };
    let label = format!("{color}{:^5}{reset}", level.to_string().to_uppercase());

    match topic {
        Some(t) => format!("{label}| [{t}] {message}"),
        None => format!("{label}| {message}"),
    }
}

#[macro_export]
macro_rules! log {
    // log!("scan", Level::Warn, "skipped {}", path)
    ($topic:literal, $level:expr, $fmt:expr, $($arg:tt)*) => {{
        $crate::log!(@inner $level, Some($topic), $fmt, $($arg)*);
    }};
    ($topic:literal, $level:expr, $fmt:expr) => {{
        $crate::log!(@inner $level, Some($topic), $fmt);
    }};

    // log!(Level::Info, "scanned {} files", n)
    ($level:expr, $fmt:expr, $($arg:tt)*) => {{
        $crate::log!(@inner $level, None, $fmt, $($arg)*);
    }};
    ($level:expr, $fmt:expr) => {{
        $crate::log!(@inner $level, None, $fmt);
    }};

    (@inner $level:expr, $topic:expr, $fmt:expr $(, $($arg:tt)*)?) => {{
        let level = $level;
        if $crate::log::enabled(level) {
            let topic: Option<&str> = $topic;
            let message = format!($fmt $(, $($arg)*)?);

            eprintln!("{}", $crate::log::format_line(level, topic, &message));
        }
    }};
}

///
/// TESTS
///
