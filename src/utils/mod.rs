/// Sanitize a title for use as a filename by replacing characters that
/// are illegal on common file systems with underscores
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.mp4"), "test_file.mp4");
        assert_eq!(sanitize_filename("normal-name.mp4"), "normal-name.mp4");
        assert_eq!(sanitize_filename("a/b:c*d"), "a_b_c_d");
    }

    #[test]
    fn test_sanitize_filename_total() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("no illegal chars"), "no illegal chars");
    }

    #[test]
    fn test_sanitize_filename_idempotent() {
        let once = sanitize_filename("a<b>c:d\"e?f*g");
        assert_eq!(sanitize_filename(&once), once);
    }
}
