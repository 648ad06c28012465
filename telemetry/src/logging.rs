use std::path::PathBuf;
use colored::Colorize;
use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Standard log file name prefix. Optionally appended with a timestamp
/// depending on the rotation strategy.
const LOG_FILE_NAME_PREFIX: &str = "membership.log";

pub struct LoggerConfig {
    pub log_level: Level,
    pub show_log_level: bool,
    pub show_crate_name: bool,
    pub show_time: bool,
    pub show_path: bool,
    pub logs_dir: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            show_log_level: true,
            show_crate_name: false,
            show_time: true,
            show_path: false,
            logs_dir: None,
        }
    }
}

/// Configure logging telemetry with a global handler. Returns worker guards
/// that must be kept alive for the lifetime of the process when file logging
/// is enabled (dropping a guard flushes and stops its background writer).
pub fn init_logger(config: LoggerConfig) -> Vec<WorkerGuard> {
    let LoggerConfig {
        log_level,
        show_log_level,
        show_crate_name,
        show_time,
        show_path,
        logs_dir,
    } = config;

    if let Some(dir) = logs_dir {
        let directory = PathBuf::from(dir);
        let appender = rolling::daily(directory, LOG_FILE_NAME_PREFIX);
        return build_subscriber(
            log_level,
            show_log_level,
            show_crate_name,
            show_time,
            show_path,
            Some(appender),
        );
    }
    build_subscriber(
        log_level,
        show_log_level,
        show_crate_name,
        show_time,
        show_path,
        None,
    )
}

/// Builds a subscriber with multiple layers into a [tracing](https://crates.io/crates/tracing)
/// subscriber and initializes it as the global default. Logs to stdout and,
/// when an appender is given, to a daily-rotated file at `debug` level.
pub fn build_subscriber(
    log_level: Level,
    show_log_level: bool,
    show_crate_name: bool,
    show_time: bool,
    show_path: bool,
    appender: Option<RollingFileAppender>,
) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let stdout_env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match log_level {
            Level::ERROR => "daemon=error,membership=error".to_owned(),
            Level::WARN => "daemon=warn,membership=warn".to_owned(),
            Level::INFO => "daemon=info,membership=info".to_owned(),
            Level::DEBUG => "daemon=debug,membership=debug".to_owned(),
            Level::TRACE => "daemon=trace,membership=trace".to_owned(),
        })
    });

    let stdout_formatting_layer = AnsiTermLayer {
        show_log_level,
        show_crate_name,
        show_time,
        show_path,
    }
    .with_filter(stdout_env_filter);

    if let Some(appender) = appender {
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let file_env_filter = EnvFilter::from("daemon=debug,membership=debug");

        tracing_subscriber::registry()
            .with(stdout_formatting_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_filter(file_env_filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(stdout_formatting_layer)
            .init();
    }

    guards
}

#[derive(Debug)]
pub struct AnsiVisitor;

impl tracing::field::Visit for AnsiVisitor {
    fn record_f64(&mut self, _: &tracing::field::Field, value: f64) {
        print!("{value}")
    }

    fn record_i64(&mut self, _: &tracing::field::Field, value: i64) {
        print!("{value}")
    }

    fn record_u64(&mut self, _: &tracing::field::Field, value: u64) {
        print!("{value}")
    }

    fn record_bool(&mut self, _: &tracing::field::Field, value: bool) {
        print!("{value}")
    }

    fn record_str(&mut self, _: &tracing::field::Field, value: &str) {
        print!("{value}")
    }

    fn record_error(
        &mut self,
        _: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        print!("{value}")
    }

    fn record_debug(&mut self, _: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        print!("{value:?}")
    }
}

/// A plain ANSI-colored line formatter for tracing events.
#[derive(Debug)]
pub struct AnsiTermLayer {
    pub show_log_level: bool,
    pub show_crate_name: bool,
    pub show_time: bool,
    pub show_path: bool,
}

impl<S> Layer<S> for AnsiTermLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if self.show_time {
            let utc = chrono::Utc::now().to_rfc3339();
            let strip_len = utc.find('.').unwrap_or(utc.len());
            let formatted_utc = utc[..strip_len].trim_end().replace('T', " ");
            print!("[{}]", formatted_utc.blue());
        }

        if self.show_log_level {
            match *event.metadata().level() {
                Level::ERROR => print!("{}", "[ERROR]".red()),
                Level::WARN => print!("{}", "[WARN ]".yellow()),
                Level::INFO => print!("{}", "[INFO ]".cyan()),
                Level::DEBUG => print!("{}", "[DEBUG]".cyan()),
                Level::TRACE => print!("{}", "[TRACE]".purple()),
            }
        }

        if self.show_crate_name {
            print!("{}", format!("[{}]", event.metadata().target()).bright_blue());
        }

        if self.show_path {
            if let Some(file) = event.metadata().file() {
                let line = event.metadata().line().unwrap_or(0);
                print!("{}", format!("[{}:{}]", file, line).blue());
            }
        }

        print!(" ");

        let mut visitor = AnsiVisitor;
        event.record(&mut visitor);
        println!();
    }
}
