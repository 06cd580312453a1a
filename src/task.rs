//! Task-spawning shim (`SPEC_FULL.md` §5), trimmed from the teacher's
//! `tokio_runtime`/`wasm_runtime` feature-gated `cfg_if!` chain down to the
//! single `tokio_runtime` variant this crate's CLI/server domain needs.

pub fn spawn_local<F>(fut: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(fut);
}

pub fn spawn<F>(fut: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut)
}

pub fn spawn_blocking<F, R>(f: F) -> tokio::task::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
}
