use std::{env, io};

use tracing::{debug, level_filters::LevelFilter, Level};
use tracing_subscriber::{
    fmt::{
        format::{Format, Writer},
        writer::MakeWriterExt,
    },
    EnvFilter,
};

struct CustomTimer;

impl tracing_subscriber::fmt::time::FormatTime for CustomTimer {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(writer, "{} - {}", now.format("%d %B"), now.format("%H:%M:%S%.6f"))
    }
}

/// `log_level` applies unless `directives` (the value of `RUST_LOG`) says otherwise.
fn build_filter(log_level: LevelFilter, directives: Option<&str>) -> EnvFilter {
    match directives.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::builder().parse_lossy(directives),
        None => EnvFilter::builder().parse_lossy(log_level.to_string()),
    }
}

/// Progress goes to stdout, warnings and errors to stderr.
pub fn setup_logger(log_level: LevelFilter) {
    let directives = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(log_level, directives.as_deref());

    let format = Format::default().with_timer(CustomTimer).with_level(true).with_target(false);

    let writer = io::stderr.with_max_level(Level::WARN).or_else(io::stdout);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .event_format(format)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Logger has already been set up, continuing...");
    }
}

pub fn setup_info_logger() {
    setup_logger(LevelFilter::INFO);
}
