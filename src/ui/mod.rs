use iced::{
    widget::{button, column, pick_list, progress_bar, scrollable, text, text_input, Column, Space},
    Element, Length,
};

/// Source site selector. Single-valued for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    YouTube,
}

impl Source {
    pub const ALL: [Source; 1] = [Source::YouTube];
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::YouTube => write!(f, "YouTube"),
        }
    }
}

/// One selectable entry of the format dropdown. Carries the index into
/// the session's fetched format list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub index: usize,
    pub label: String,
}

impl std::fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Main view state
pub struct DownloadView {
    pub link: String,
    pub source: Source,
    pub format_choices: Vec<FormatChoice>,
    pub selected_format: Option<FormatChoice>,
    pub status_message: String,
    /// Last known percent complete, 0-100.
    pub progress: u8,
    pub history: Vec<String>,
    pub is_fetching: bool,
    pub is_downloading: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            link: String::new(),
            source: Source::default(),
            format_choices: Vec::new(),
            selected_format: None,
            status_message: "Enter a link and fetch its formats".to_string(),
            progress: 0,
            history: Vec::new(),
            is_fetching: false,
            is_downloading: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    LinkChanged(String),
    SourceSelected(Source),
    FormatSelected(FormatChoice),
    FetchPressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::LinkChanged(link) => {
                self.link = link;
            }
            DownloadMessage::SourceSelected(source) => {
                self.source = source;
            }
            DownloadMessage::FormatSelected(choice) => {
                self.selected_format = Some(choice);
            }
            DownloadMessage::FetchPressed | DownloadMessage::DownloadPressed => {
                // Handled by the app
            }
        }
    }

    /// Replace the format dropdown contents, dropping any stale selection.
    pub fn set_format_labels(&mut self, labels: Vec<String>) {
        self.format_choices = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| FormatChoice { index, label })
            .collect();
        self.selected_format = None;
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_format.as_ref().map(|choice| choice.index)
    }

    pub fn selector_enabled(&self) -> bool {
        !self.format_choices.is_empty()
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let busy = self.is_fetching || self.is_downloading;

        let mut fetch_button = button("Fetch Formats").padding([10, 20]);
        if !busy {
            fetch_button = fetch_button.on_press(DownloadMessage::FetchPressed);
        }

        let mut download_button = button("Download").padding([10, 20]);
        if !busy {
            download_button = download_button.on_press(DownloadMessage::DownloadPressed);
        }

        let history = Column::with_children(
            self.history
                .iter()
                .map(|name| text(name).size(14).into()),
        )
        .spacing(5);

        column![
            text("Simple Video Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text_input("Enter link...", &self.link)
                .on_input(DownloadMessage::LinkChanged)
                .padding(10),
            pick_list(
                Source::ALL,
                Some(self.source),
                DownloadMessage::SourceSelected
            )
            .padding(10),
            pick_list(
                self.format_choices.clone(),
                self.selected_format.clone(),
                DownloadMessage::FormatSelected
            )
            .placeholder("Select a format...")
            .padding(10),
            fetch_button,
            download_button,
            text(&self.status_message).size(14),
            progress_bar(0.0..=100.0, f32::from(self.progress)),
            Space::new().height(Length::Fixed(10.0)),
            text("Downloads:").size(16),
            scrollable(history).height(Length::Fill),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_format_labels_resets_selection() {
        let mut view = DownloadView::default();
        view.set_format_labels(vec!["a".to_string(), "b".to_string()]);
        view.update(DownloadMessage::FormatSelected(view.format_choices[1].clone()));
        assert_eq!(view.selected_index(), Some(1));
        assert!(view.selector_enabled());

        view.set_format_labels(Vec::new());
        assert_eq!(view.selected_index(), None);
        assert!(!view.selector_enabled());
    }
}
