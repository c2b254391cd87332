//! Logger module
//!
//! Bracket-tagged lines for the build pipeline, route wiring and the
//! server lifecycle, plus formatted access log entries. Lines go to the
//! writer installed by [`init`], or to stdout/stderr before that.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use std::path::Path;

/// Install the process-wide writer from the logging section
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: usize) {
    write_info("======================================");
    write_info(&format!("Serving site: {}", config.site.title));
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Routes installed: {routes}"));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_server_stopped(addr: &SocketAddr) {
    write_info(&format!("[SERVER] Stopped listening on {addr}"));
}

pub fn log_route_installed(kind: &str, pattern: &str) {
    write_info(&format!("[ROUTE] {kind:<6} {pattern}"));
}

pub fn log_build_start(out_dir: &Path, pages: usize) {
    write_info(&format!("[BUILD] Rendering {pages} page(s) into {}", out_dir.display()));
}

pub fn log_page_written(path: &Path, bytes: u64) {
    write_info(&format!("[BUILD] {} ({bytes} bytes)", path.display()));
}

pub fn log_build_finished(pages: usize) {
    write_info(&format!("[BUILD] Done, {pages} file(s) written"));
}

pub fn log_watch(started: usize) {
    write_info(&format!("[WATCH] Started {started} page watcher(s)"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_info(&entry.format(format));
}
