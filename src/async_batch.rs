//! Async batch loading
//!
//! Reads many level files concurrently. Results come back in the order the
//! paths were given.

#[cfg(feature = "async")]
/// Concurrent level loading with a configurable concurrency limit
pub mod loader {
    use crate::container::{decode_level_with, parse_level_metadata};
    use crate::level::{Level, LevelMetadata};
    use crate::options::DecodeOptions;
    use crate::{C2mError, Result};
    use futures::stream::{self, StreamExt, TryStreamExt};
    use std::path::{Path, PathBuf};

    /// Concurrent level file loader
    #[derive(Debug, Clone)]
    pub struct AsyncLevelLoader {
        concurrency_limit: usize,
        options: DecodeOptions,
    }

    impl AsyncLevelLoader {
        /// Create a loader with one task per CPU
        pub fn new() -> Self {
            Self {
                concurrency_limit: num_cpus::get(),
                options: DecodeOptions::default(),
            }
        }

        /// Set the concurrency limit
        pub fn with_concurrency(mut self, limit: usize) -> Self {
            self.concurrency_limit = limit.max(1);
            self
        }

        /// Set the decoder options used for every file
        pub fn with_options(mut self, options: DecodeOptions) -> Self {
            self.options = options;
            self
        }

        /// Current concurrency limit
        pub fn concurrency_limit(&self) -> usize {
            self.concurrency_limit
        }

        /// Load and decode every file; the first failure aborts the batch
        pub async fn load_levels<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Result<Vec<(PathBuf, Level)>> {
            stream::iter(files.into_iter().map(|path| {
                let loader = self.clone();
                async move { loader.load_single(path).await }
            }))
            .buffered(self.concurrency_limit)
            .try_collect()
            .await
        }

        /// Load every file, keeping each file's outcome
        pub async fn load_levels_lenient<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Vec<(PathBuf, Result<Level>)> {
            stream::iter(files.into_iter().map(|path| {
                let loader = self.clone();
                async move {
                    let path_buf = path.as_ref().to_path_buf();
                    let result = loader.load_single(path).await.map(|(_, level)| level);
                    (path_buf, result)
                }
            }))
            .buffered(self.concurrency_limit)
            .collect()
            .await
        }

        /// Read just the title of every file
        pub async fn load_titles<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Result<Vec<(PathBuf, LevelMetadata)>> {
            stream::iter(files.into_iter().map(|path| async move {
                let path = path.as_ref();
                let data = tokio::fs::read(path).await?;
                Ok::<_, C2mError>((path.to_path_buf(), parse_level_metadata(&data)?))
            }))
            .buffered(self.concurrency_limit)
            .try_collect()
            .await
        }

        async fn load_single<P: AsRef<Path>>(&self, path: P) -> Result<(PathBuf, Level)> {
            let path = path.as_ref();
            let data = tokio::fs::read(path).await?;
            log::debug!("Decoding {} ({} bytes)", path.display(), data.len());

            let level = decode_level_with(&data, &self.options)?;
            // Decoding is CPU-bound; let other reads make progress
            tokio::task::yield_now().await;
            Ok((path.to_path_buf(), level))
        }
    }

    impl Default for AsyncLevelLoader {
        fn default() -> Self {
            Self::new()
        }
    }

}

#[cfg(feature = "async")]
pub use loader::AsyncLevelLoader;
