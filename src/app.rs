use std::path::PathBuf;

use futures::StreamExt;
use iced::Task;

use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::domain::{AppError, DownloadPhase, DownloadPlan, FormatDescriptor};
use crate::ui::{DownloadMessage, DownloadView};
use crate::ytdlp::YtDlpClient;

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    // Session state: replaced wholesale on every fetch
    available_formats: Vec<FormatDescriptor>,
    phase: DownloadPhase,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        let client = YtDlpClient::new(Default::default());

        Self {
            view: DownloadView::default(),
            coordinator: DownloadCoordinator::new(client),
            available_formats: Vec::new(),
            phase: DownloadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    FormatsFetched(Result<Vec<FormatDescriptor>, AppError>),
    /// (Selected path, pending plan); `None` means the dialog was cancelled
    FileSaveSelected(Option<PathBuf>, DownloadPlan),
    DownloadProgressed(DownloadEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::FetchPressed => return start_fetch(app),
                DownloadMessage::DownloadPressed => return start_download(app),
                _ => {}
            }
        }
        Message::FormatsFetched(result) => {
            app.view.is_fetching = false;
            match result {
                Ok(formats) => {
                    let labels = formats.iter().map(|f| f.label()).collect();
                    app.available_formats = formats;
                    app.view.set_format_labels(labels);

                    if app.available_formats.is_empty() {
                        app.view.status_message = "No supported formats found.".to_string();
                        app.phase = DownloadPhase::Idle;
                    } else {
                        app.view.status_message =
                            "Formats fetched. Please select one to download.".to_string();
                        app.phase = DownloadPhase::FormatsReady;
                    }
                }
                Err(e) => {
                    tracing::error!("error fetching formats: {}", e);
                    app.available_formats.clear();
                    app.view.set_format_labels(Vec::new());
                    app.view.status_message = e.to_string();
                    app.phase = DownloadPhase::Failed;
                }
            }
        }
        Message::FileSaveSelected(path_opt, plan) => match path_opt {
            Some(path) => {
                app.view.status_message = format!("Downloading to: {}", path.display());
                app.phase = DownloadPhase::Downloading;

                let stream = app.coordinator.download_stream(plan, path);
                return Task::stream(stream.map(Message::DownloadProgressed));
            }
            None => {
                // User cancelled the save dialog
                app.view.is_downloading = false;
                app.view.status_message = "Download canceled.".to_string();
                app.phase = DownloadPhase::FormatsReady;
            }
        },
        Message::DownloadProgressed(event) => match event {
            DownloadEvent::Progress(Some(percent)) => {
                app.view.progress = percent;
                app.view.status_message = format!("Downloading: {}%", percent);
            }
            DownloadEvent::Progress(None) => {
                app.view.status_message = "Downloading...".to_string();
            }
            DownloadEvent::Completed(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                app.view.progress = 100;
                app.view.status_message = "Video downloaded successfully.".to_string();
                app.view.history.push(name);
                app.view.is_downloading = false;
                app.phase = DownloadPhase::Completed;
            }
            DownloadEvent::Failed(e) => {
                tracing::error!("download error: {}", e);
                app.view.status_message = e.to_string();
                app.view.is_downloading = false;
                app.phase = DownloadPhase::Failed;
            }
        },
    }
    Task::none()
}

fn start_fetch(app: &mut DownloadApp) -> Task<Message> {
    if app.phase.is_busy() {
        return Task::none();
    }

    if app.view.link.trim().is_empty() {
        app.view.status_message = AppError::EmptyLink.to_string();
        return Task::none();
    }

    app.view.is_fetching = true;
    app.view.status_message = "Fetching formats...".to_string();
    app.view.progress = 0;
    app.phase = DownloadPhase::Fetching;

    let coordinator = app.coordinator.clone();
    let link = app.view.link.clone();

    // iced Task::perform runs on the background tokio executor
    Task::perform(
        async move { coordinator.fetch_formats(link).await },
        Message::FormatsFetched,
    )
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    if app.phase.is_busy() {
        return Task::none();
    }

    match app.coordinator.plan_download(
        &app.view.link,
        &app.available_formats,
        app.view.selected_index(),
    ) {
        Ok(plan) => {
            app.view.is_downloading = true;
            app.view.progress = 0;
            app.view.status_message = "Please select save location...".to_string();
            app.phase = DownloadPhase::AwaitingSavePath;

            let coordinator = app.coordinator.clone();
            let suggested = plan.suggested_filename.clone();

            Task::perform(
                async move {
                    let path = coordinator.choose_save_path(suggested).await;
                    (path, plan)
                },
                |(path, plan)| Message::FileSaveSelected(path, plan),
            )
        }
        Err(e) => {
            app.view.status_message = e.to_string();
            Task::none()
        }
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
