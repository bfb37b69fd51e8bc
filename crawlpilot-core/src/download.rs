// Download filename resolution

use crawlpilot_client::disposition::sanitize_filename;
use crawlpilot_client::ExportFormat;
use std::path::{Path, PathBuf};

pub const DEFAULT_DOWNLOAD_NAME: &str = "crawl_results";

/// Pick the file name for a download: the server's suggestion when usable,
/// otherwise [`DEFAULT_DOWNLOAD_NAME`]. The format's extension is appended
/// when the chosen name has none.
pub fn resolve_download_filename(suggested: Option<&str>, format: ExportFormat) -> String {
    let name = suggested
        .map(sanitize_filename)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());

    if has_extension(&name) {
        name
    } else {
        format!("{}.{}", name.trim_end_matches('.'), format.extension())
    }
}

fn has_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map_or(false, |ext| !ext.is_empty())
}

/// First path in `dir` for `filename` that does not exist yet, numbering
/// duplicates as `name (1).ext`, `name (2).ext`, ...
pub fn available_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().to_string());

    (1..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_gets_format_extension() {
        assert_eq!(
            resolve_download_filename(None, ExportFormat::Markdown),
            "crawl_results.md"
        );
        assert_eq!(
            resolve_download_filename(None, ExportFormat::Json),
            "crawl_results.json"
        );
    }

    #[test]
    fn test_suggested_name_is_kept() {
        assert_eq!(
            resolve_download_filename(Some("example_com.md"), ExportFormat::Markdown),
            "example_com.md"
        );
    }

    #[test]
    fn test_suggested_name_without_extension() {
        assert_eq!(
            resolve_download_filename(Some("report"), ExportFormat::Json),
            "report.json"
        );
        assert_eq!(
            resolve_download_filename(Some("report."), ExportFormat::Markdown),
            "report.md"
        );
    }

    #[test]
    fn test_blank_suggestion_falls_back() {
        assert_eq!(
            resolve_download_filename(Some("  "), ExportFormat::Json),
            "crawl_results.json"
        );
        assert_eq!(
            resolve_download_filename(Some("../"), ExportFormat::Json),
            "crawl_results.json"
        );
    }

    #[test]
    fn test_available_path_numbers_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let first = available_path(dir.path(), "out.md");
        assert_eq!(first, dir.path().join("out.md"));

        std::fs::write(&first, "x").unwrap();
        let second = available_path(dir.path(), "out.md");
        assert_eq!(second, dir.path().join("out (1).md"));

        std::fs::write(&second, "x").unwrap();
        assert_eq!(available_path(dir.path(), "out.md"), dir.path().join("out (2).md"));
    }
}
