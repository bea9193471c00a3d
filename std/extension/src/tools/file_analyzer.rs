//! The `file_analyzer` tool.
//!
//! Reports metadata, and optionally a bounded text preview, for files
//! inside the allowed roots. The allow-list check runs before any stat.
//! A missing file or an unreadable body is reported inside the result
//! rather than failing the call.

use crate::{
    error::ToolError,
    roots::AllowedRoots,
    schema::{Field, Schema},
    tools::Tool,
};
use serde::{Deserialize, Serialize};
use std::{fs::Metadata, io, path::Path};
use tokio::io::AsyncReadExt;

pub static SCHEMA: Schema = Schema::new(&[
    Field::string("file_path", "Path to file to analyze").required(),
    Field::choice(
        "analysis_type",
        "Type of analysis to perform",
        AnalysisType::CODES,
    )
    .with_default("basic"),
]);

/// Files larger than this are never read.
pub const CONTENT_LIMIT: u64 = 1024 * 1024;

/// Maximum number of characters in `content_preview`.
pub const PREVIEW_CHARS: usize = 1000;

/// How much to report about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Basic,
    Detailed,
    Content,
}

impl AnalysisType {
    pub const CODES: &'static [&'static str] = &["basic", "detailed", "content"];
}

/// Arguments for `file_analyzer`.
#[derive(Debug, Deserialize)]
pub struct FileAnalyzerArgs {
    pub file_path: String,
    pub analysis_type: AnalysisType,
}

/// Result of `file_analyzer`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileAnalysis {
    /// The path is allowed but nothing exists there.
    Missing {
        success: bool,
        error: &'static str,
        path: String,
    },
    Found(FileReport),
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub name: String,
    pub exists: bool,
    pub is_file: bool,
    pub is_directory: bool,
    pub size_bytes: Option<u64>,
    pub modified: Option<String>,
    pub analysis_type: AnalysisType,
    #[serde(flatten)]
    pub details: Option<FileDetails>,
    #[serde(flatten)]
    pub content: Option<ContentReport>,
}

/// Fields added by the `detailed` tier.
#[derive(Debug, Serialize)]
pub struct FileDetails {
    pub extension: String,
    pub parent: String,
    pub permissions: Option<String>,
    pub size_human: String,
}

/// Fields added by the `content` tier.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ContentReport {
    Read {
        content_preview: String,
        line_count: usize,
        char_count: usize,
    },
    Failed {
        content_error: String,
    },
}

/// Format a byte count with binary prefixes, e.g. `1.50 KB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TB")
}

#[cfg(unix)]
fn permissions(meta: &Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    Some(format!("0o{:o}", meta.permissions().mode()))
}

#[cfg(not(unix))]
fn permissions(_meta: &Metadata) -> Option<String> {
    None
}

fn file_details(path: &Path, meta: &Metadata) -> FileDetails {
    let parent = path
        .parent()
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".into());
    FileDetails {
        extension: path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default(),
        parent,
        permissions: permissions(meta),
        size_human: format_bytes(meta.len()),
    }
}

/// Read at most `CONTENT_LIMIT` bytes; `None` if the file holds more.
async fn read_bounded(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let file = tokio::fs::File::open(path).await?;
    let mut reader = file.take(CONTENT_LIMIT + 1);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok((buf.len() as u64 <= CONTENT_LIMIT).then_some(buf))
}

/// Count lines. `\r\n` is one break, and lone `\r`, vertical tab, form
/// feed, the separators `\x1c`..`\x1e`, NEL, U+2028 and U+2029 also end a
/// line. A trailing break does not start another line.
pub fn line_count(text: &str) -> usize {
    let mut count = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}' => {
                count += 1;
                open = false;
            }
            '\r' => {
                chars.next_if_eq(&'\n');
                count += 1;
                open = false;
            }
            _ => open = true,
        }
    }
    count + usize::from(open)
}

fn summarize(text: &str) -> ContentReport {
    let char_count = text.chars().count();
    let content_preview = if char_count > PREVIEW_CHARS {
        let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        text.to_owned()
    };
    ContentReport::Read {
        content_preview,
        line_count: line_count(text),
        char_count,
    }
}

async fn read_content(path: &Path, size: u64) -> ContentReport {
    let too_large = || ContentReport::Failed {
        content_error: "File too large to read".into(),
    };
    if size > CONTENT_LIMIT {
        return too_large();
    }
    match read_bounded(path).await {
        Ok(Some(bytes)) => summarize(&String::from_utf8_lossy(&bytes)),
        Ok(None) => too_large(),
        Err(e) => ContentReport::Failed {
            content_error: format!("Could not read file: {e}"),
        },
    }
}

/// Analyzes files inside the allowed roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAnalyzer;

impl Tool for FileAnalyzer {
    type Args = FileAnalyzerArgs;
    type Output = FileAnalysis;

    async fn execute(
        &self,
        args: FileAnalyzerArgs,
        roots: &AllowedRoots,
    ) -> Result<FileAnalysis, ToolError> {
        if args.file_path.is_empty() {
            return Err(ToolError::InvalidValue("file_path is required".into()));
        }
        let path = Path::new(&args.file_path);
        let resolved = roots.authorize(path)?;

        let meta = match tokio::fs::metadata(&resolved).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileAnalysis::Missing {
                    success: false,
                    error: "File does not exist",
                    path: args.file_path,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let is_file = meta.is_file();
        let details = (is_file && args.analysis_type != AnalysisType::Basic)
            .then(|| file_details(path, &meta));
        let content = if is_file && args.analysis_type == AnalysisType::Content {
            Some(read_content(&resolved, meta.len()).await)
        } else {
            None
        };

        Ok(FileAnalysis::Found(FileReport {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: args.file_path.clone(),
            exists: true,
            is_file,
            is_directory: meta.is_dir(),
            size_bytes: is_file.then(|| meta.len()),
            modified: meta
                .modified()
                .ok()
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339()),
            analysis_type: args.analysis_type,
            details,
            content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::roots::AllowedRoots;
    use crate::tools::{
        Tool,
        file_analyzer::{
            AnalysisType, CONTENT_LIMIT, FileAnalyzer, FileAnalyzerArgs, format_bytes, line_count,
        },
    };
    use serde_json::Value;
    use std::{fs, path::Path};

    async fn analyze(
        roots: &AllowedRoots,
        path: &Path,
        analysis_type: AnalysisType,
    ) -> Result<Value, crate::error::ToolError> {
        let args = FileAnalyzerArgs {
            file_path: path.display().to_string(),
            analysis_type,
        };
        let report = FileAnalyzer.execute(args, roots).await?;
        Ok(serde_json::to_value(report).unwrap())
    }

    #[tokio::test]
    async fn basic_reports_metadata_only() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Basic).await.unwrap();
        assert_eq!(report["name"], "notes.txt");
        assert_eq!(report["exists"], true);
        assert_eq!(report["is_file"], true);
        assert_eq!(report["is_directory"], false);
        assert_eq!(report["size_bytes"], 5);
        assert_eq!(report["analysis_type"], "basic");
        assert!(report["modified"].is_string());
        assert!(report.get("extension").is_none());
        assert!(report.get("content_preview").is_none());
        assert!(report.get("success").is_none());
    }

    #[tokio::test]
    async fn detailed_adds_file_details() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Detailed).await.unwrap();
        assert_eq!(report["extension"], ".txt");
        assert_eq!(report["parent"], tmp.path().display().to_string());
        assert_eq!(report["size_human"], "5.00 B");
        #[cfg(unix)]
        assert!(report["permissions"].as_str().unwrap().starts_with("0o100"));
        assert!(report.get("content_preview").is_none());
    }

    #[tokio::test]
    async fn content_reads_text() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("lines.txt");
        fs::write(&file, "one\ntwo\nthree\n").unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        assert_eq!(report["content_preview"], "one\ntwo\nthree\n");
        assert_eq!(report["line_count"], 3);
        assert_eq!(report["char_count"], 14);
        assert_eq!(report["extension"], ".txt");
        assert!(report.get("content_error").is_none());
    }

    #[tokio::test]
    async fn content_preview_is_truncated() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("long.txt");
        fs::write(&file, "é".repeat(1500)).unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        let preview = report["content_preview"].as_str().unwrap();
        assert_eq!(preview.chars().count(), 1003);
        assert!(preview.ends_with("é..."));
        assert_eq!(report["char_count"], 1500);
        assert_eq!(report["line_count"], 1);
    }

    #[tokio::test]
    async fn content_replaces_invalid_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("bin.dat");
        fs::write(&file, [b'h', 0xff, b'i']).unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        assert_eq!(report["content_preview"], "h\u{FFFD}i");
        assert_eq!(report["char_count"], 3);
    }

    #[tokio::test]
    async fn content_skips_oversized_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("big.txt");
        fs::write(&file, vec![b'a'; CONTENT_LIMIT as usize + 1]).unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        assert_eq!(report["content_error"], "File too large to read");
        assert!(report.get("content_preview").is_none());
        assert!(report.get("line_count").is_none());
        assert!(report.get("char_count").is_none());
        assert_eq!(report["size_human"], "1.00 MB");
    }

    #[tokio::test]
    async fn content_reads_file_at_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("edge.txt");
        fs::write(&file, vec![b'a'; CONTENT_LIMIT as usize]).unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        assert_eq!(report["char_count"], CONTENT_LIMIT);
    }

    #[tokio::test]
    async fn missing_file_is_soft_result() {
        let tmp = tempfile::tempdir().unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();
        let file = tmp.path().join("absent.txt");

        let report = analyze(&roots, &file, AnalysisType::Basic).await.unwrap();
        assert_eq!(report["success"], false);
        assert_eq!(report["error"], "File does not exist");
        assert_eq!(report["path"], file.display().to_string());
    }

    #[tokio::test]
    async fn directory_has_no_size_or_details() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sub");
        fs::create_dir(&dir).unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &dir, AnalysisType::Content).await.unwrap();
        assert_eq!(report["is_directory"], true);
        assert_eq!(report["size_bytes"], Value::Null);
        assert!(report.get("extension").is_none());
        assert!(report.get("content_preview").is_none());
        assert!(report.get("content_error").is_none());
    }

    #[tokio::test]
    async fn outside_path_is_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let allowed = tmp.path().join("allowed");
        fs::create_dir(&allowed).unwrap();
        let roots = AllowedRoots::from_dirs([&allowed]).unwrap();

        let err = analyze(&roots, &tmp.path().join("elsewhere.txt"), AnalysisType::Basic)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "PermissionError");
    }

    #[tokio::test]
    async fn empty_path_is_value_error() {
        let roots = AllowedRoots::from_dirs([std::env::temp_dir()]).unwrap();
        let err = analyze(&roots, Path::new(""), AnalysisType::Basic)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    }

    #[test]
    fn counts_lines_on_every_break() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a"), 1);
        assert_eq!(line_count("a\n"), 1);
        assert_eq!(line_count("\n\n"), 2);
        assert_eq!(line_count("a\rb"), 2);
        assert_eq!(line_count("a\r\nb\r\n"), 2);
        assert_eq!(line_count("a\u{0b}b\u{0c}c\u{1c}d\u{1d}e\u{1e}f"), 6);
        assert_eq!(line_count("a\u{85}b\u{2028}c\u{2029}d"), 4);
        assert_eq!(line_count("a\r\rb"), 3);
    }

    #[tokio::test]
    async fn content_counts_carriage_return_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("mac.txt");
        fs::write(&file, "one\rtwo\rthree").unwrap();
        let roots = AllowedRoots::from_dirs([tmp.path()]).unwrap();

        let report = analyze(&roots, &file, AnalysisType::Content).await.unwrap();
        assert_eq!(report["line_count"], 3);
    }

    #[test]
    fn every_code_parses_into_its_analysis_type() {
        for code in AnalysisType::CODES {
            let parsed: AnalysisType = serde_json::from_value(serde_json::json!(code)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), *code);
        }
    }

    #[test]
    fn formats_binary_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(1 << 40), "1.00 TB");
        assert_eq!(format_bytes(1 << 50), "1024.00 TB");
    }
}
