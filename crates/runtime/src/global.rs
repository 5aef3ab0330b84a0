// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::OnceLock;

use graphd_protos::config::RuntimeOptions;
use mea::latch::Latch;

use crate::Builder;
use crate::Runtime;

pub fn make_runtime(runtime_name: &str, thread_name: &str, worker_threads: usize) -> Runtime {
    log::info!(
        "creating runtime with runtime_name: {runtime_name}, thread_name: {thread_name}, work_threads: {worker_threads}."
    );
    Builder::default()
        .runtime_name(runtime_name)
        .thread_name(thread_name)
        .worker_threads(worker_threads)
        .build()
        .expect("failed to create runtime")
}

#[cfg(any(test, feature = "test"))]
pub fn test_runtime() -> &'static Runtime {
    static RT: OnceLock<Runtime> = OnceLock::new();
    RT.get_or_init(|| make_runtime("test_runtime", "test_thread", 4))
}

#[derive(Debug)]
struct GlobalRuntimes {
    io_runtime: Runtime,
    worker_runtime: Runtime,
    admin_runtime: Runtime,
}

static GLOBAL_RUNTIMES: OnceLock<GlobalRuntimes> = OnceLock::new();

pub fn init(opts: &RuntimeOptions) {
    GLOBAL_RUNTIMES.get_or_init(|| do_initialize_runtimes(opts));
}

fn do_initialize_runtimes(opts: &RuntimeOptions) -> GlobalRuntimes {
    log::info!("initializing global runtimes: {opts:?}");

    set_panic_hook();

    let RuntimeOptions {
        io_runtime_threads,
        worker_runtime_threads,
        admin_runtime_threads,
    } = opts;

    let io_runtime = make_runtime(
        "io_runtime",
        "io_thread",
        io_runtime_threads.unwrap_or_else(default_io_threads).get(),
    );
    let worker_runtime = make_runtime(
        "worker_runtime",
        "worker_thread",
        worker_runtime_threads
            .unwrap_or_else(default_worker_threads)
            .get(),
    );
    let admin_runtime = make_runtime(
        "admin_runtime",
        "admin_thread",
        admin_runtime_threads
            .unwrap_or_else(default_admin_threads)
            .get(),
    );

    GlobalRuntimes {
        io_runtime,
        worker_runtime,
        admin_runtime,
    }
}

// Default I/O pool size per the meta/storage daemon `num_io_threads` flag.
fn default_io_threads() -> NonZeroUsize {
    NonZeroUsize::new(16).unwrap()
}

// Default worker pool size per the meta/storage daemon `num_worker_threads` flag.
fn default_worker_threads() -> NonZeroUsize {
    NonZeroUsize::new(32).unwrap()
}

// Default admin pool size per `meta_http_thread_num`.
fn default_admin_threads() -> NonZeroUsize {
    NonZeroUsize::new(3).unwrap()
}

fn set_panic_hook() {
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("panic occurred: {info}\nbacktrace:\n{backtrace}");
        better_panic::Settings::auto().create_panic_handler()(info);
        log::info!("shutting down runtimes");
        shutdown();
        std::process::exit(1);
    }));
}

fn fetch_runtimes_or_default() -> &'static GlobalRuntimes {
    GLOBAL_RUNTIMES.get_or_init(|| do_initialize_runtimes(&RuntimeOptions::default()))
}

pub fn io_runtime() -> &'static Runtime {
    &fetch_runtimes_or_default().io_runtime
}

pub fn worker_runtime() -> &'static Runtime {
    &fetch_runtimes_or_default().worker_runtime
}

pub fn admin_runtime() -> &'static Runtime {
    &fetch_runtimes_or_default().admin_runtime
}

fn shutdown_latch() -> &'static Arc<Latch> {
    static LATCH: OnceLock<Arc<Latch>> = OnceLock::new();
    LATCH.get_or_init(|| Arc::new(Latch::new(1)))
}

/// Trips the process-wide shutdown latch. Called from the `SIGINT`/`SIGTERM` handler and from a
/// panicked task's unwind path; idempotent.
pub fn shutdown() {
    shutdown_latch().count_down();
}

/// Resolves once [`shutdown`] has been called.
pub async fn wait_for_shutdown() {
    shutdown_latch().wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_block_on() {
        let handle = io_runtime().spawn(async { 1 + 1 });
        assert_eq!(2, io_runtime().block_on(handle));

        let handle = worker_runtime().spawn(async { 2 + 2 });
        assert_eq!(4, worker_runtime().block_on(handle));

        let handle = admin_runtime().spawn(async { 4 + 4 });
        assert_eq!(8, admin_runtime().block_on(handle));
    }

    #[test]
    fn test_spawn_from_blocking() {
        let runtimes = [io_runtime(), worker_runtime(), admin_runtime()];

        for runtime in runtimes {
            let out = runtime.block_on(async move {
                let inner = runtime
                    .spawn_blocking(|| runtime.spawn(async move { "hello" }))
                    .await;
                inner.await
            });
            assert_eq!(out, "hello")
        }
    }
}
