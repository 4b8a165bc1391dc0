use serde::Deserialize;
use serde_json::Value;

use crate::domain::FormatDescriptor;

/// Container/codec extensions the UI offers for download.
pub const ALLOWED_EXTS: &[&str] = &["mp4", "webm", "mp3", "m4a"];

/// Configuration for invoking the yt-dlp binary.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub binary: String,
    /// Format-selection expression passed to `-f` for every download.
    pub format_expr: String,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: std::env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
            format_expr: "bestvideo+bestaudio/best".to_string(),
        }
    }
}

/// One entry of the `formats` array in a yt-dlp metadata dump.
#[derive(Debug, Clone, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    format_note: Option<String>,
    title: Option<String>,
}

/// Filter a raw `formats` value down to the descriptors the UI can offer,
/// preserving relative order. Entries with an extension outside the
/// allow-list are dropped; entries that are not objects are skipped; a
/// non-array input yields an empty list.
pub fn filter_formats(formats: &Value, fallback_title: &str) -> Vec<FormatDescriptor> {
    let Some(entries) = formats.as_array() else {
        tracing::warn!("unexpected formats shape, expected an array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw: RawFormat = serde_json::from_value(entry.clone()).ok()?;
            let ext = raw.ext?;
            if !ALLOWED_EXTS.contains(&ext.as_str()) {
                return None;
            }
            Some(FormatDescriptor {
                format_id: raw.format_id,
                ext,
                format_note: raw.format_note,
                title: raw.title.unwrap_or_else(|| fallback_title.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_allowed_extensions_in_order() {
        let formats = json!([
            { "format_id": "18", "ext": "mp4", "format_note": "360p" },
            { "format_id": "999", "ext": "flv", "format_note": "legacy" },
            { "format_id": "251", "ext": "webm", "format_note": "audio only" },
            { "format_id": "140", "ext": "m4a" },
        ]);

        let filtered = filter_formats(&formats, "video");
        let ids: Vec<_> = filtered
            .iter()
            .map(|f| f.format_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["18", "251", "140"]);
    }

    #[test]
    fn non_array_input_yields_empty() {
        assert!(filter_formats(&json!({"ext": "mp4"}), "video").is_empty());
        assert!(filter_formats(&json!("mp4"), "video").is_empty());
        assert!(filter_formats(&Value::Null, "video").is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let formats = json!([
            "not a dict",
            42,
            { "format_id": "18", "ext": "mp4" },
        ]);
        assert_eq!(filter_formats(&formats, "video").len(), 1);
    }

    #[test]
    fn missing_ext_is_dropped_missing_id_is_kept() {
        let formats = json!([
            { "format_id": "18" },
            { "ext": "mp4" },
        ]);
        let filtered = filter_formats(&formats, "video");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].format_id, None);
        assert_eq!(filtered[0].title, "video");
    }

    #[test]
    fn entry_title_wins_over_fallback() {
        let formats = json!([
            { "format_id": "18", "ext": "mp4", "title": "own title" },
        ]);
        let filtered = filter_formats(&formats, "fallback");
        assert_eq!(filtered[0].title, "own title");
    }
}
