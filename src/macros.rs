/// Logs a line tagged with the component that produced it.
/// Usage:
/// ```rust
/// use log::Level;
/// bootlog::bootlog_log!(Level::Info, "fs", "Initializing FS");
/// bootlog::bootlog_log!(Level::Error, "db", "[Error] Can't open database: {}", "locked");
/// ```
/// Logs like:
/// [2026-10-16T16:32:10+02:00][INFO ][bootlog::fs][pid=4568][tid=ThreadId(2)] [fs] Initializing FS
///
/// Timestamp, level, pid and tid come from the `fern` formatter installed in
/// `main.rs`; the macro only adds the component tag.
#[macro_export]
macro_rules! bootlog_log {
    ($level:expr, $component:expr, $fmt:expr $(, $($arg:tt)+)?) => {
        log::log!(
            $level,
            concat!("[", $component, "] ", $fmt)
            $(, $($arg)+)?
        )
    };
}
