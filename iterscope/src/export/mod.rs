//! Report rendering and export
//!
//! Every format implements [`Reporter`]: `render = prefix + body + postfix`.
//! The recursive walk lives in [`walk`] as a free helper driven by per-node
//! callbacks; formats needing their own recursion (the performance report)
//! walk the tree directly.
//!
//! | Key          | Extension | Output                                         |
//! |--------------|-----------|------------------------------------------------|
//! | `csv`        | `csv`     | `Iteration ID,NodeType,Name,Details,Duration`  |
//! | `chrome-json`| `json`    | Chrome Trace Event Format (µs)                 |
//! | `html`       | `html`    | full collapsible tree                          |
//! | `html-perf`  | `html`    | pruned tree plus category summaries            |
//! | `plaintext`  | `txt`     | tab-indented tree                              |
//!
//! Files are written whole through a temporary file in the destination
//! directory, then renamed into place.

pub mod chrome_trace;
pub mod csv;
pub mod html;
pub mod html_perf;
pub mod plaintext;
pub mod registry;
pub mod walk;

pub use chrome_trace::ChromeTraceReporter;
pub use csv::CsvReporter;
pub use html::HtmlReporter;
pub use html_perf::HtmlPerfReporter;
pub use plaintext::PlaintextReporter;
pub use registry::{ReporterFactory, ReporterRegistry};

use log::info;
use std::io::Write;
use std::path::Path;

use crate::config::ReportHeader;
use crate::domain::ExportError;
use crate::iteration::IterationRegistry;

/// Everything a reporter reads.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub registry: &'a IterationRegistry,
    pub header: &'a ReportHeader,
}

pub trait Reporter: Send {
    /// Human-readable format name.
    fn name(&self) -> &str;

    /// File extension, lowercase, without the leading dot.
    fn extension(&self) -> &str;

    fn prefix(&self, _ctx: &ReportContext<'_>) -> String {
        String::new()
    }

    fn body(&self, ctx: &ReportContext<'_>) -> String;

    fn postfix(&self, _ctx: &ReportContext<'_>) -> String {
        String::new()
    }

    fn render(&self, ctx: &ReportContext<'_>) -> String {
        let mut text = self.prefix(ctx);
        text.push_str(&self.body(ctx));
        text.push_str(&self.postfix(ctx));
        text
    }
}

/// Render `reporter` and write the result to `path`.
///
/// Returns `Ok(false)` without writing when `path` is empty.
///
/// # Errors
///
/// Returns an error if the destination cannot be written.
pub fn export_report(
    reporter: &dyn Reporter,
    ctx: &ReportContext<'_>,
    path: &Path,
) -> Result<bool, ExportError> {
    if path.as_os_str().is_empty() {
        return Ok(false);
    }

    let text = reporter.render(ctx);
    write_atomically(path, &text)?;
    info!("\"{}\" exported ({})", path.display(), reporter.name());
    Ok(true)
}

/// Write `contents` to a temporary file next to `path`, then rename it over
/// `path`. Readers never observe a partially written report.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// persisted.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), ExportError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}
