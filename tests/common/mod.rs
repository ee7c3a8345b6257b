//! Stub yt-dlp scripts and service wiring shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use yt_audio_proxy::logger::LogConfig;
use yt_audio_proxy::models::AppConfig;
use yt_audio_proxy::{AudioService, Logger};

/// Records its arguments, working directory and cookie file next to `{log}`,
/// then writes a fake audio file at the `-o` template.
pub const CONVERTING_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "{log}"
pwd > "{log}.pwd"
out=""
ext="mp3"
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  if [ "$prev" = "--audio-format" ]; then ext="$a"; fi
  if [ "$prev" = "--cookies" ]; then cat "$a" > "{log}.cookies"; fi
  prev="$a"
done
file=$(printf '%s' "$out" | sed -e 's/%(title)s/Some Song/' -e "s/%(ext)s/$ext/")
printf 'fake-audio' > "$file"
"#;

pub const FAILING_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "{log}"
pwd > "{log}.pwd"
echo "ERROR: [youtube] abc: Video unavailable" >&2
exit 1
"#;

pub const SILENT_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "{log}"
exit 0
"#;

pub const HANGING_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "{log}"
exec sleep 30
"#;

/// A scratch directory holding a stub tool, its invocation log and working directories
pub struct Harness {
    pub root: tempfile::TempDir,
    pub tool: PathBuf,
    pub log: PathBuf,
    pub workdirs: PathBuf,
}

impl Harness {
    pub fn new(script: &str) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let log = root.path().join("invocation.log");
        let tool = root.path().join("yt-dlp");
        fs::write(&tool, script.replace("{log}", &log.to_string_lossy())).expect("write stub");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod stub");

        let workdirs = root.path().join("work");
        fs::create_dir(&workdirs).expect("create work dir");

        Self { root, tool, log, workdirs }
    }

    pub fn logger(&self) -> Logger {
        Logger::with_config(
            self.root.path().join("logs.log"),
            LogConfig { debug_enabled: true, console: false, ..LogConfig::default() },
        )
    }

    pub fn service(&self, config: &AppConfig) -> AudioService {
        let mut config = config.clone();
        config.server.workdir_root = Some(self.workdirs.clone());
        AudioService::new(&config, self.tool.clone(), self.logger()).expect("service")
    }

    /// Arguments the stub received, one per line
    pub fn invocation(&self) -> Option<Vec<String>> {
        fs::read_to_string(&self.log)
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }

    pub fn tool_cwd(&self) -> Option<PathBuf> {
        fs::read_to_string(self.log.with_extension("log.pwd"))
            .ok()
            .map(|s| PathBuf::from(s.trim()))
    }

    pub fn cookies_seen(&self) -> Option<String> {
        fs::read_to_string(self.log.with_extension("log.cookies")).ok()
    }

    pub fn workdir_count(&self) -> usize {
        fs::read_dir(&self.workdirs).map(|d| d.count()).unwrap_or(0)
    }
}

pub fn strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}
