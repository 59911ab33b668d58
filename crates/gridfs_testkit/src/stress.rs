//! Stress helpers for grid streams.
//!
//! These drive many streams at once against one filesystem and check that
//! every file reads back exactly as written.

use crate::fixtures::patterned_bytes;
use gridfs_core::{GridFilesystem, GridResult};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Files written and read back per thread.
    pub files_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of every file in bytes.
    pub file_size: usize,
    /// Bytes handed to each write call.
    pub write_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            files_per_thread: 25,
            threads: 4,
            file_size: 10_000,
            write_size: 333,
        }
    }
}

fn write_in_pieces(
    fs: &GridFilesystem,
    path: &str,
    content: &[u8],
    write_size: usize,
) -> GridResult<()> {
    let mut out = fs.open_output(path, false)?;
    for piece in content.chunks(write_size.max(1)) {
        out.write_bytes(piece)?;
    }
    out.close()
}

/// Writes then reads back one file, returning whether it matched.
fn round_trip(fs: &GridFilesystem, path: &str, content: &[u8], write_size: usize) -> bool {
    if write_in_pieces(fs, path, content, write_size).is_err() {
        return false;
    }

    let mut back = Vec::with_capacity(content.len());
    match fs.open_input(path) {
        Ok(mut input) => input.read_to_end(&mut back).is_ok() && back == content,
        Err(_) => false,
    }
}

/// Writes and reads back distinct files from one thread.
pub fn stress_sequential_files(fs: &GridFilesystem, config: &StressConfig) -> StressTestResult {
    let content = patterned_bytes(config.file_size);
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.files_per_thread {
        let path = format!("/stress/seq/{i}");
        if round_trip(fs, &path, &content, config.write_size) {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Writes and reads back distinct files from many threads at once.
///
/// Each thread owns its own paths, so a failure means streams interfered
/// through the shared caches.
pub fn stress_concurrent_files(fs: &GridFilesystem, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let fs = fs.clone();
            let config = config.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                // Offset the pattern per thread so mixed-up chunks show.
                let mut content = patterned_bytes(config.file_size);
                let len = content.len().max(1);
                content.rotate_left(t % len);
                for i in 0..config.files_per_thread {
                    let path = format!("/stress/t{t}/{i}");
                    if round_trip(&fs, &path, &content, config.write_size) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Reads one file from many threads at once, each with its own stream.
pub fn stress_concurrent_readers(fs: &GridFilesystem, config: &StressConfig) -> StressTestResult {
    let content = patterned_bytes(config.file_size);
    let path = "/stress/shared";
    if !round_trip(fs, path, &content, config.write_size) {
        return StressTestResult::new(0, 1, Duration::ZERO);
    }

    let content = Arc::new(content);
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let fs = fs.clone();
            let content = Arc::clone(&content);
            let reads = config.files_per_thread;
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                for _ in 0..reads {
                    let mut back = Vec::new();
                    let ok = fs
                        .open_input(path)
                        .map(|mut input| input.read_to_end(&mut back).is_ok())
                        .unwrap_or(false);
                    if ok && back == *content {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
