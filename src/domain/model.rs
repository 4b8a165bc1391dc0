/// One downloadable stream variant, as reported by yt-dlp.
///
/// Held only for the current UI session; the list is replaced wholesale
/// on every fetch and selection is by index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// May be absent in malformed metadata; checked before download.
    pub format_id: Option<String>,
    pub ext: String,
    pub format_note: Option<String>,
    pub title: String,
}

impl FormatDescriptor {
    /// Human-readable label shown in the format selector.
    pub fn label(&self) -> String {
        format!(
            "{} - {} ({})",
            self.format_id.as_deref().unwrap_or("N/A"),
            self.ext,
            self.format_note.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub url: String,
    pub format: FormatDescriptor,
    pub suggested_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Fetching,
    FormatsReady,
    AwaitingSavePath,
    Downloading,
    Completed,
    Failed,
}

impl DownloadPhase {
    /// An operation is in flight (or the save dialog is up), so neither
    /// button should start a new one.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            DownloadPhase::Fetching | DownloadPhase::AwaitingSavePath | DownloadPhase::Downloading
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_with_note() {
        let fmt = FormatDescriptor {
            format_id: Some("22".to_string()),
            ext: "mp4".to_string(),
            format_note: Some("720p".to_string()),
            title: "clip".to_string(),
        };
        assert_eq!(fmt.label(), "22 - mp4 (720p)");
    }

    #[test]
    fn label_with_missing_pieces() {
        let fmt = FormatDescriptor {
            format_id: None,
            ext: "m4a".to_string(),
            format_note: None,
            title: "clip".to_string(),
        };
        assert_eq!(fmt.label(), "N/A - m4a (N/A)");
    }
}
