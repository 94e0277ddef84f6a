//! Thread pool configuration for parallel extraction
//!
//! Each scheduler owns the pool it runs on; there is no process-wide pool, so
//! independent schedulers with different settings can coexist.

use labelmesh_core::{Error, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = one per logical CPU)
    pub num_threads: Option<usize>,
    /// Thread stack size in bytes
    pub stack_size: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            stack_size: Some(8 * 1024 * 1024), // 8MB stack
            thread_name_prefix: "labelmesh-extract".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Thread count the built pool will have
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Build a dedicated rayon pool from this configuration
    pub fn build(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new().num_threads(self.effective_threads());

        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        if !self.thread_name_prefix.is_empty() {
            let prefix = self.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        builder
            .build()
            .map_err(|e| Error::ThreadPool(format!("Failed to create thread pool: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_config() {
        let config = ThreadPoolConfig::default()
            .with_threads(4)
            .with_stack_size(16 * 1024 * 1024)
            .with_thread_name_prefix("mesher");

        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.stack_size, Some(16 * 1024 * 1024));
        assert_eq!(config.thread_name_prefix, "mesher");
        assert_eq!(config.effective_threads(), 4);
    }

    #[test]
    fn test_default_uses_available_cpus() {
        let config = ThreadPoolConfig::default();
        assert_eq!(config.effective_threads(), num_cpus::get().max(1));
    }

    #[test]
    fn test_build_names_threads() {
        let pool = ThreadPoolConfig::default()
            .with_threads(2)
            .with_thread_name_prefix("mesher")
            .build()
            .unwrap();

        assert_eq!(pool.current_num_threads(), 2);
        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.unwrap().starts_with("mesher-"));
    }

    #[test]
    fn test_zero_threads_still_builds_one() {
        let pool = ThreadPoolConfig::default().with_threads(0).build().unwrap();
        assert_eq!(pool.current_num_threads(), 1);
    }
}
