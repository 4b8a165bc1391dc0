use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;

use crate::domain::FormatDescriptor;

use super::models::{filter_formats, YtDlpConfig};

#[derive(Error, Debug)]
pub enum YtDlpError {
    #[error("Failed to launch yt-dlp: {0}")]
    Spawn(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
}

pub type Result<T> = std::result::Result<T, YtDlpError>;

/// Narrow interface over the external yt-dlp binary. The rest of the app
/// only sees domain shapes, never yt-dlp's native output.
#[derive(Clone)]
pub struct YtDlpClient {
    config: YtDlpConfig,
}

impl YtDlpClient {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Extract the available stream formats for `url` without downloading,
    /// filtered to the extensions the UI supports.
    pub async fn list_formats(&self, url: &str) -> Result<Vec<FormatDescriptor>> {
        let output = Command::new(&self.config.binary)
            .args(["-J", "--no-warnings", "--no-playlist"])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| YtDlpError::Spawn(format!("{}: {}", self.config.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YtDlpError::Extraction(condense_stderr(&stderr)));
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| YtDlpError::InvalidMetadata(e.to_string()))?;

        let title = info
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("video");

        Ok(filter_formats(
            info.get("formats").unwrap_or(&Value::Null),
            title,
        ))
    }

    /// Spawn a download of `url` into `dest` with stdout piped so progress
    /// lines can be relayed. Quality is the configured format expression,
    /// not the format the user picked; the selection only shapes the
    /// suggested filename.
    pub fn spawn_download(&self, url: &str, dest: &Path) -> Result<Child> {
        Command::new(&self.config.binary)
            .arg("-f")
            .arg(&self.config.format_expr)
            .arg("-o")
            .arg(dest)
            .args(["--newline", "--no-warnings", "--no-playlist"])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| YtDlpError::Spawn(format!("{}: {}", self.config.binary, e)))
    }
}

/// Drain a child's stderr on its own task so a chatty subprocess can
/// never block on a full pipe while stdout is being read. Keeps the last
/// 200 lines for error reporting.
pub(crate) fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr).lines();
        let mut tail: VecDeque<String> = VecDeque::new();
        while let Ok(Some(line)) = reader.next_line().await {
            tracing::debug!("yt-dlp stderr: {}", line);
            tail.push_back(line);
            if tail.len() > 200 {
                tail.pop_front();
            }
        }
        Vec::from(tail).join("\n")
    })
}

/// One progress-relevant line of yt-dlp output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLine {
    /// A `[download]` progress line. `percent` is `None` when the printed
    /// percent string could not be parsed.
    Downloading { percent: Option<u8> },
    /// yt-dlp announced where the output file is being written.
    Destination(PathBuf),
}

/// Parse a single line of `--newline` output. Unrecognized lines yield
/// `None` and are ignored by the caller.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("[download] Destination:") {
        let path = rest.trim();
        if !path.is_empty() {
            return Some(ProgressLine::Destination(PathBuf::from(path)));
        }
        return None;
    }

    if let Some(rest) = line.strip_prefix("[Merger] Merging formats into \"") {
        let path = rest.trim_end_matches('"');
        if !path.is_empty() {
            return Some(ProgressLine::Destination(PathBuf::from(path)));
        }
        return None;
    }

    let re = Regex::new(r"^\[download\]\s+(\S+)%").ok()?;
    if let Some(caps) = re.captures(line) {
        return Some(ProgressLine::Downloading {
            percent: parse_percent(&caps[1]),
        });
    }

    None
}

/// Parse a percent string such as "45.0" or "45.0%" to an integer 0-100.
/// Malformed input maps to `None`, never an error.
pub fn parse_percent(raw: &str) -> Option<u8> {
    raw.trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0) as u8)
}

/// Condense yt-dlp stderr into its most recent ERROR line, falling back
/// to the last non-empty line.
pub(crate) fn condense_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "yt-dlp failed".to_string())
}
