//! Logger bootstrap (`SPEC_FULL.md` §7: diagnostics through `log`, not bare
//! `eprintln!`). Trimmed from the teacher's multi-backend `cfg_if!` chain
//! (`flexi_logger`/`wasm_logger`/`esp_logger`) down to the single
//! `env_logger` backend this crate's CLI/server domain needs.

use core::sync::atomic::{AtomicBool, Ordering};

static INIT: AtomicBool = AtomicBool::new(false);

/// Initializes the logger with debug-level filtering (all messages).
pub fn init_logger_debug() {
    if !INIT.swap(true, Ordering::SeqCst) {
        init(true);
    }
}

/// Initializes the logger with default filtering (warn and above).
pub fn init_logger() {
    if !INIT.swap(true, Ordering::SeqCst) {
        init(false);
    }
}

fn init(debug: bool) {
    let default_level = if debug { "phpv=debug" } else { "phpv=warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    log::info!("logger initialized");
}
