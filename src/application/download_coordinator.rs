use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use url::Url;

use crate::{
    domain::{AppError, DownloadPlan, FormatDescriptor},
    utils::sanitize_filename,
    ytdlp::{
        client::{condense_stderr, drain_stderr, parse_progress_line, ProgressLine},
        YtDlpClient,
    },
};

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Percent complete; `None` means yt-dlp printed an unparsable
    /// percent and the UI should show an indeterminate status.
    Progress(Option<u8>),
    Completed(PathBuf),
    Failed(AppError),
}

/// Orchestrates the fetch/select/download workflow on top of the yt-dlp
/// client. The GUI layer is a thin view bound to this.
#[derive(Clone)]
pub struct DownloadCoordinator {
    client: YtDlpClient,
}

impl DownloadCoordinator {
    pub fn new(client: YtDlpClient) -> Self {
        Self { client }
    }

    /// Validate the link and query yt-dlp for its filtered format list.
    pub async fn fetch_formats(&self, link: String) -> Result<Vec<FormatDescriptor>, AppError> {
        let link = validate_link(&link)?;
        self.client
            .list_formats(&link)
            .await
            .map_err(|e| AppError::Extraction(e.to_string()))
    }

    /// Check the session state and derive a download plan. A plan exists
    /// only when the format list is non-empty and the selection index is
    /// in bounds; the selected format decides the suggested filename and
    /// extension, not the streams actually fetched.
    pub fn plan_download(
        &self,
        link: &str,
        formats: &[FormatDescriptor],
        selected: Option<usize>,
    ) -> Result<DownloadPlan, AppError> {
        let url = validate_link(link)?;

        if formats.is_empty() {
            return Err(AppError::NoFormats);
        }

        let index = selected.ok_or(AppError::NoSelection)?;
        let format = formats.get(index).ok_or(AppError::NoSelection)?.clone();

        if format.format_id.as_deref().unwrap_or("").is_empty() {
            return Err(AppError::MissingFormatId);
        }

        let stem = sanitize_filename(&format.title);
        let stem = stem.trim_matches(|c| c == '.' || c == ' ');
        let stem = if stem.is_empty() { "video" } else { stem };
        let suggested_filename = format!("{}.{}", stem, format.ext);

        Ok(DownloadPlan {
            url,
            format,
            suggested_filename,
        })
    }

    /// Ask the user where to save the file. `None` means the dialog was
    /// cancelled, which is not an error.
    pub async fn choose_save_path(&self, suggested_filename: String) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested_filename)
            .add_filter("Video Files", &["mp4", "mkv", "webm"])
            .add_filter("All Files", &["*"])
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Run the download as a stream of events. The subprocess's progress
    /// lines cross to the UI loop only through this stream; nothing is
    /// mutated from the worker side.
    pub fn download_stream(
        &self,
        plan: DownloadPlan,
        path: PathBuf,
    ) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(
            DownloadRuntimeState::Start {
                client: self.client.clone(),
                url: plan.url,
                path,
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start { client, url, path } => {
                        match client.spawn_download(&url, &path) {
                            Ok(mut child) => {
                                let lines = child
                                    .stdout
                                    .take()
                                    .map(|stdout| BufReader::new(stdout).lines());
                                // Drained concurrently so a chatty child
                                // can never wedge on a full stderr pipe.
                                let stderr_task = child.stderr.take().map(drain_stderr);
                                Some((
                                    DownloadEvent::Progress(Some(0)),
                                    DownloadRuntimeState::Running {
                                        child,
                                        lines,
                                        stderr_task,
                                        dest: path,
                                    },
                                ))
                            }
                            Err(e) => Some((
                                DownloadEvent::Failed(AppError::Download(e.to_string())),
                                DownloadRuntimeState::Finished,
                            )),
                        }
                    }
                    DownloadRuntimeState::Running {
                        mut child,
                        mut lines,
                        stderr_task,
                        mut dest,
                    } => {
                        loop {
                            let next = match lines.as_mut() {
                                Some(reader) => reader.next_line().await,
                                None => Ok(None),
                            };
                            match next {
                                Ok(Some(line)) => match parse_progress_line(&line) {
                                    Some(ProgressLine::Downloading { percent }) => {
                                        return Some((
                                            DownloadEvent::Progress(percent),
                                            DownloadRuntimeState::Running {
                                                child,
                                                lines,
                                                stderr_task,
                                                dest,
                                            },
                                        ));
                                    }
                                    Some(ProgressLine::Destination(path)) => dest = path,
                                    None => {}
                                },
                                Ok(None) => break,
                                Err(e) => {
                                    tracing::warn!("error reading yt-dlp output: {}", e);
                                    break;
                                }
                            }
                        }

                        // Output drained; wait for exit and join the
                        // stderr drain for the condensed error text.
                        let status = child.wait().await;
                        let stderr = match stderr_task {
                            Some(task) => task.await.unwrap_or_default(),
                            None => String::new(),
                        };

                        match status {
                            Ok(status) if status.success() => Some((
                                DownloadEvent::Completed(dest),
                                DownloadRuntimeState::Finished,
                            )),
                            Ok(_) => Some((
                                DownloadEvent::Failed(AppError::Download(condense_stderr(
                                    &stderr,
                                ))),
                                DownloadRuntimeState::Finished,
                            )),
                            Err(e) => Some((
                                DownloadEvent::Failed(AppError::Io(e.to_string())),
                                DownloadRuntimeState::Finished,
                            )),
                        }
                    }
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

fn validate_link(link: &str) -> Result<String, AppError> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyLink);
    }

    let parsed = Url::parse(trimmed).map_err(|e| AppError::InvalidLink(e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::InvalidLink(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

enum DownloadRuntimeState {
    Start {
        client: YtDlpClient,
        url: String,
        path: PathBuf,
    },
    Running {
        child: Child,
        lines: Option<Lines<BufReader<ChildStdout>>>,
        stderr_task: Option<JoinHandle<String>>,
        dest: PathBuf,
    },
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytdlp::YtDlpConfig;

    fn coordinator() -> DownloadCoordinator {
        DownloadCoordinator::new(YtDlpClient::new(YtDlpConfig::default()))
    }

    fn sample_format() -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some("22".to_string()),
            ext: "mp4".to_string(),
            format_note: Some("720p".to_string()),
            title: "a/b:c*d".to_string(),
        }
    }

    const LINK: &str = "https://www.youtube.com/watch?v=abc123";

    #[tokio::test]
    async fn fetch_with_empty_link_does_not_invoke_ytdlp() {
        let err = coordinator().fetch_formats(String::new()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyLink));
        assert_eq!(err.to_string(), "Please enter a link first.");
    }

    #[test]
    fn plan_requires_a_link() {
        let err = coordinator()
            .plan_download("  ", &[sample_format()], Some(0))
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyLink));
    }

    #[test]
    fn plan_rejects_invalid_link() {
        let err = coordinator()
            .plan_download("not a url", &[sample_format()], Some(0))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidLink(_)));

        let err = coordinator()
            .plan_download("ftp://host/file", &[sample_format()], Some(0))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidLink(_)));
    }

    #[test]
    fn plan_requires_fetched_formats() {
        let err = coordinator().plan_download(LINK, &[], Some(0)).unwrap_err();
        assert!(matches!(err, AppError::NoFormats));
    }

    #[test]
    fn plan_requires_an_in_bounds_selection() {
        let formats = [sample_format()];

        let err = coordinator().plan_download(LINK, &formats, None).unwrap_err();
        assert!(matches!(err, AppError::NoSelection));

        let err = coordinator()
            .plan_download(LINK, &formats, Some(3))
            .unwrap_err();
        assert!(matches!(err, AppError::NoSelection));
    }

    #[test]
    fn plan_requires_a_format_id() {
        let mut format = sample_format();
        format.format_id = None;
        let err = coordinator()
            .plan_download(LINK, &[format], Some(0))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingFormatId));
    }

    #[test]
    fn plan_suggests_a_sanitized_filename() {
        let plan = coordinator()
            .plan_download(LINK, &[sample_format()], Some(0))
            .unwrap();
        assert_eq!(plan.suggested_filename, "a_b_c_d.mp4");
        assert_eq!(plan.url, LINK);
    }

    #[test]
    fn plan_falls_back_to_a_default_stem() {
        let mut format = sample_format();
        format.title = " .. ".to_string();
        let plan = coordinator()
            .plan_download(LINK, &[format], Some(0))
            .unwrap();
        assert_eq!(plan.suggested_filename, "video.mp4");
    }
}
