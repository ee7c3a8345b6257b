//! Request pipeline: validate, prepare a working directory, run yt-dlp, collect the file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::args::{AllowList, ArgumentValidator, SanitizedArgs};
use crate::command::{self, CommandContext};
use crate::constants::flags;
use crate::error::{AppError, Result};
use crate::executor::Executor;
use crate::logger::Logger;
use crate::models::{AppConfig, AudioKind, DefaultFlags, MediaFile};
use crate::workdir::WorkDir;

/// Shared, read-only state for converting URLs to audio
#[derive(Clone)]
pub struct AudioService {
    allow_list: Arc<AllowList>,
    defaults: Arc<DefaultFlags>,
    cookies: Arc<str>,
    keep_workdirs: bool,
    workdir_base: Option<PathBuf>,
    executor: Executor,
    permits: Arc<Semaphore>,
    logger: Logger,
}

impl AudioService {
    /// Compiles the allow-list and wires the executor from `config`
    pub fn new(config: &AppConfig, executable: PathBuf, logger: Logger) -> Result<Self> {
        let allow_list = AllowList::compile(&config.allowed_args)?;
        let executor = Executor::new(
            executable,
            Duration::from_secs(config.server.timeout_secs),
            logger.clone(),
        );

        Ok(Self {
            allow_list: Arc::new(allow_list),
            defaults: Arc::new(config.defaults.clone()),
            cookies: Arc::from(config.server.cookies.as_str()),
            keep_workdirs: config.server.keep_workdirs,
            workdir_base: config.server.workdir_root.clone(),
            executor,
            permits: Arc::new(Semaphore::new(config.server.max_concurrent_downloads.max(1))),
            logger,
        })
    }

    /// Converts `url` to an audio file using the caller's `raw_args`.
    ///
    /// Input errors are reported before any directory is created or process spawned.
    pub async fn build_and_run(&self, url: &str, raw_args: &[String]) -> Result<MediaFile> {
        let url = command::validate_url(url)?;
        command::reject_output_flags(raw_args, &self.allow_list)?;
        let sanitized = ArgumentValidator::validate_with_logger(raw_args, &self.allow_list, Some(&self.logger))?;
        let kind = AudioKind::from_format(sanitized.last_value_of(flags::AUDIO_FORMAT));

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Config("download limiter closed".to_string()))?;

        let workdir = WorkDir::create(self.workdir_base.clone()).await?;
        self.logger.log_debug(&format!("Working directory: {}", workdir.path().display()));

        let result = self.run_in(&workdir, url, &sanitized, kind).await;

        match workdir.release(self.keep_workdirs).await {
            Ok(Some(kept)) => self.logger.log_info(&format!("Keeping working directory {}", kept.display())),
            Ok(None) => {}
            Err(e) => self.logger.log_warning(&format!("Could not remove working directory: {}", e)),
        }

        match &result {
            Ok(file) => self.logger.log_info(&format!("Served {} ({} bytes) for {}", file.filename, file.data.len(), url)),
            Err(e) => self.logger.log_error(&format!("Request for {} failed: {}", url, e)),
        }
        result
    }

    async fn run_in(
        &self,
        workdir: &WorkDir,
        url: &str,
        sanitized: &SanitizedArgs,
        kind: AudioKind,
    ) -> Result<MediaFile> {
        let cookie_file = if self.cookies.is_empty() {
            None
        } else {
            Some(workdir.write_cookies(&self.cookies).await?)
        };

        let ctx = CommandContext {
            workdir: workdir.path(),
            defaults: &self.defaults,
            cookie_file: cookie_file.as_deref(),
        };
        let args = command::build_command(url, sanitized, &ctx)?;

        self.executor.execute(&args, workdir.path()).await?;

        let output = workdir.find_output(kind.extension).await?;
        let data = tokio::fs::read(&output).await?;

        Ok(MediaFile {
            data: bytes::Bytes::from(data),
            filename: format!("{}.{}", uuid::Uuid::new_v4().simple(), kind.extension),
            content_type: kind.content_type,
        })
    }
}
