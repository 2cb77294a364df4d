//! Tracing setup for the controller.
//!
//! Diagnostics go to `./logs/controller.log` as plain text so they sit next
//! to the JSON logs without fighting the interactive display for the
//! terminal.

use std::fs::{self, File};
use std::path::Path;

use time::format_description;
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

use crate::logs::LOGS_DIR;

/// Will panic on error.
pub fn init_logger(system_dir: &Path) {
    let dir = system_dir.join(LOGS_DIR);
    fs::create_dir_all(&dir).expect("could not create logs directory");
    let file = File::create(dir.join("controller.log")).expect("could not create controller.log");
    let writer = BoxMakeWriter::new(file);

    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        local_offset,
        format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
            .expect("time format description"),
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).expect("Could not set global default tracing subscriber. Consider disabling logs if you are already setting a subscriber.");
}
