//! Error reporting with source context.
//!
//! Uses ariadne for pretty-printed parse errors.

use ariadne::{Color, Label, Report, ReportKind, Source};
use httpdtree_config::ParseError;
use std::io::Write;
use std::path::Path;

/// Report a parse error in `source` (the content of `path`) to `writer`.
pub fn report_parse_error<W: Write>(
    error: &ParseError,
    path: &Path,
    source: &str,
    writer: &mut W,
) -> std::io::Result<()> {
    let path_str = path.display().to_string();
    let span = error.span();
    let range = span.start..span.end.max(span.start);

    Report::build(ReportKind::Error, (path_str.as_str(), range.clone()))
        .with_message(error.to_string())
        .with_label(
            Label::new((path_str.as_str(), range))
                .with_message(error.label())
                .with_color(Color::Red),
        )
        .finish()
        .write((path_str.as_str(), Source::from(source)), &mut *writer)
}
