//! Terminal feedback for batch runs.
//!
//! `reconcile` advances one bar tick per artist payload; walking the library
//! gets a spinner. With `--log-only` both stay hidden and payload counts are
//! printed to stderr every `interval` payloads instead.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const PAYLOAD_BAR_TEMPLATE: &str = "{msg} {pos}/{len} payloads [{bar:30.green/white}] {elapsed} (eta {eta})";
const LIBRARY_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} ({elapsed})";

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// "850ms", "12.3s", "2.1m"
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

pub fn create_progress_bar(payloads: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(payloads);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::default_bar().template(PAYLOAD_BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(msg.to_string());
    pb
}

/// "[reconcile] 50/200 payloads (25%)" on every `interval`th payload and on the last one.
fn payload_line(phase: &str, done: u64, total: u64, interval: u64) -> Option<String> {
    if total == 0 || (done % interval.max(1) != 0 && done != total) {
        return None;
    }
    let pct = done * 100 / total;
    Some(format!("[{}] {}/{} payloads ({}%)", phase, done, total, pct))
}

/// Stand-in for the bar in log-only mode; a no-op otherwise.
pub fn log_progress(phase: &str, done: u64, total: u64, interval: u64) {
    if !is_log_only() {
        return;
    }
    if let Some(line) = payload_line(phase, done, total, interval) {
        eprintln!("{}", line);
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return pb;
    }
    if let Ok(style) = ProgressStyle::default_spinner().template(LIBRARY_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
