//! Process-wide `slog` setup (spec §12 "structured logs"). Two formats are
//! supported, selected by `observability.log_format`: a human-readable
//! terminal format for local development, and MozLog-shaped JSON for
//! production log aggregation, via the same `slog-mozlog-json` drain the
//! reference project uses.
use std::io;

use slog::{slog_o, Drain};
use slog_mozlog_json::MozLogJson;

/// Initializes the process-wide `slog_scope` logger. Must be called once,
/// at startup, before any component logs (most do, via `#[macro_use]
/// extern crate slog_scope`). `json` selects the MozLog format;
/// otherwise a human-readable terminal format is used.
pub fn init_logging(json: bool) {
    let logger = if json {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unknown>".to_owned());

        let drain = MozLogJson::new(io::stdout())
            .logger_name(format!(
                "{}-{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .msg_type(format!("{}:log", env!("CARGO_PKG_NAME")))
            .hostname(hostname)
            .build()
            .fuse();
        let drain = slog_envlogger::new(drain);
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!())
    } else {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_envlogger::new(drain);
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!())
    };

    // cancel_reset: `reset_logging` below handles teardown explicitly, so
    // the scope guard doesn't need to reset the logger again on drop
    // (slog-rs/slog#169).
    slog_scope::set_global_logger(logger).cancel_reset();
    slog_stdlog::init().ok();
}

pub fn reset_logging() {
    let logger = slog::Logger::root(slog::Discard, slog_o!());
    slog_scope::set_global_logger(logger).cancel_reset();
}
