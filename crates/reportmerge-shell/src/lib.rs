//! HTML shell handling for report bundles.
//!
//! A report's `index.html` carries its data as one script element:
//!
//! ```text
//! <script>
//! window.playwrightReportBase64 = "data:application/zip;base64,UEsDB...";</script>
//! ```
//!
//! [`extract_shell`] parses that marker with a small hand-written grammar and
//! splits the document into a [`ShellTemplate`] and the base64 payload.
//! [`ShellWriter`] writes a template back out with a new payload streamed
//! into the marker.
//!
//! Grammar, in order:
//!
//! 1. `<script>` followed by `\n` or `\r\n`
//! 2. `window.` then an identifier (`[A-Za-z_$][A-Za-z0-9_$]*`)
//! 3. optional blanks, `=`, optional blanks
//! 4. `"data:application/zip;base64,`, the payload (`[A-Za-z0-9+/=]*`), `"`
//! 5. an optional `;`, optional whitespace, `</script>`
//!
//! Anything else at a `<script>` position is not a marker.

use reportmerge_base64::{Base64Writer, DecodeError};
use reportmerge_output_layout::DEFAULT_REPORT_VARIABLE;
use std::io::{self, Write};
use thiserror::Error;

const SCRIPT_OPEN: &str = "<script>";
const SCRIPT_CLOSE: &str = "</script>";
const WINDOW_PREFIX: &str = "window.";
const DATA_URL_PREFIX: &str = "data:application/zip;base64,";

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("index.html does not contain embedded report data")]
    MissingReportData,
    #[error("embedded report data is not valid base64: {0}")]
    InvalidPayload(#[source] DecodeError),
}

/// The HTML around a removed marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTemplate {
    /// Text before the marker.
    pub before: String,
    /// Text after the marker.
    pub after: String,
    /// Name of the `window.*` global holding the data URL.
    pub variable: String,
}

impl ShellTemplate {
    pub fn new(before: impl Into<String>, after: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
            variable: variable.into(),
        }
    }

    /// A template whose marker goes at the end of `html`.
    pub fn appending_to(html: impl Into<String>) -> Self {
        Self::new(html, "", DEFAULT_REPORT_VARIABLE)
    }

    /// The shell with the marker construct removed.
    pub fn residual(&self) -> String {
        let mut s = String::with_capacity(self.before.len() + self.after.len());
        s.push_str(&self.before);
        s.push_str(&self.after);
        s
    }

    /// Everything written before the payload.
    pub fn script_open(&self) -> String {
        format!(
            "{SCRIPT_OPEN}\n{WINDOW_PREFIX}{} = \"{DATA_URL_PREFIX}",
            self.variable
        )
    }

    /// Everything written after the payload.
    pub fn script_close() -> String {
        format!("\";{SCRIPT_CLOSE}")
    }
}

/// Result of [`extract_shell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedShell {
    pub template: ShellTemplate,
    /// Base64 text of the embedded zip archive.
    pub payload: String,
}

impl ExtractedShell {
    pub fn decode_payload(&self) -> Result<Vec<u8>, ShellError> {
        reportmerge_base64::decode(&self.payload).map_err(ShellError::InvalidPayload)
    }
}

/// Locate the report-data marker in `html` and split it out.
///
/// The first `<script>` that parses as a marker wins.
pub fn extract_shell(html: &str) -> Result<ExtractedShell, ShellError> {
    for (start, _) in html.match_indices(SCRIPT_OPEN) {
        if let Some(marker) = parse_marker(html, start) {
            return Ok(ExtractedShell {
                template: ShellTemplate::new(
                    &html[..start],
                    &html[marker.end..],
                    marker.variable,
                ),
                payload: marker.payload.to_string(),
            });
        }
    }
    Err(ShellError::MissingReportData)
}

struct Marker<'a> {
    variable: &'a str,
    payload: &'a str,
    end: usize,
}

/// Byte cursor over the source text. Every step either consumes exactly
/// what it expects or reports failure without side effects on the caller.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn literal(&mut self, lit: &str) -> Option<()> {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            Some(())
        } else {
            None
        }
    }

    fn newline(&mut self) -> Option<()> {
        self.literal("\r\n").or_else(|| self.literal("\n"))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let first = self.rest().chars().next()?;
        if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
            return None;
        }
        Some(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'))
    }

    fn blanks(&mut self) {
        self.take_while(|c| c == ' ' || c == '\t');
    }

    fn whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

fn parse_marker(src: &str, start: usize) -> Option<Marker<'_>> {
    let mut s = Scanner { src, pos: start };
    s.literal(SCRIPT_OPEN)?;
    s.newline()?;
    s.literal(WINDOW_PREFIX)?;
    let variable = s.identifier()?;
    s.blanks();
    s.literal("=")?;
    s.blanks();
    s.literal("\"")?;
    s.literal(DATA_URL_PREFIX)?;
    let payload = s.take_while(is_base64_char);
    s.literal("\"")?;
    let _ = s.literal(";");
    s.whitespace();
    s.literal(SCRIPT_CLOSE)?;
    Some(Marker {
        variable,
        payload,
        end: s.pos,
    })
}

/// Streams a shell with a freshly generated payload.
///
/// [`begin`](Self::begin) writes the text before the marker and the script
/// opening; bytes written to the `ShellWriter` are raw archive bytes and go
/// out base64-encoded; [`finish`](Self::finish) closes the script and writes
/// the rest of the template.
#[derive(Debug)]
pub struct ShellWriter<W: Write> {
    payload: Base64Writer<W>,
    after: String,
}

impl<W: Write> ShellWriter<W> {
    pub fn begin(mut out: W, template: &ShellTemplate) -> io::Result<Self> {
        out.write_all(template.before.as_bytes())?;
        out.write_all(template.script_open().as_bytes())?;
        Ok(Self {
            payload: Base64Writer::new(out),
            after: template.after.clone(),
        })
    }

    /// Raw archive bytes accepted so far.
    pub fn payload_bytes(&self) -> u64 {
        self.payload.bytes_in()
    }

    pub fn finish(self) -> io::Result<W> {
        let mut out = self.payload.finish()?;
        out.write_all(ShellTemplate::script_close().as_bytes())?;
        out.write_all(self.after.as_bytes())?;
        out.flush()?;
        Ok(out)
    }
}

impl<W: Write> Write for ShellWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.payload.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.payload.flush()
    }
}

/// Render `template` around `archive` into a string.
pub fn render_shell(template: &ShellTemplate, archive: &[u8]) -> io::Result<String> {
    let mut writer = ShellWriter::begin(Vec::new(), template)?;
    writer.write_all(archive)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL_HEAD: &str = "<!DOCTYPE html>\n<html><head><title>Test Report</title></head><body><div id=root></div></body></html>\n";

    fn playwright_html(payload: &str) -> String {
        format!(
            "{SHELL_HEAD}<script>\nwindow.playwrightReportBase64 = \"data:application/zip;base64,{payload}\";</script>"
        )
    }

    #[test]
    fn extracts_payload_and_residual() {
        let html = playwright_html("UEsDBAo=");
        let shell = extract_shell(&html).unwrap();
        assert_eq!(shell.payload, "UEsDBAo=");
        assert_eq!(shell.template.variable, "playwrightReportBase64");
        assert_eq!(shell.template.residual(), SHELL_HEAD);
        assert_eq!(shell.template.after, "");
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = extract_shell(SHELL_HEAD).unwrap_err();
        assert!(matches!(err, ShellError::MissingReportData));
        insta::assert_snapshot!(err.to_string(), @"index.html does not contain embedded report data");
    }

    #[test]
    fn unrelated_scripts_are_skipped() {
        let html = format!(
            "<script>\nwindow.analytics = {{}};</script>{}",
            playwright_html("QUJD")
        );
        let shell = extract_shell(&html).unwrap();
        assert_eq!(shell.payload, "QUJD");
        assert!(shell.template.before.starts_with("<script>\nwindow.analytics"));
    }

    #[test]
    fn accepts_crlf_and_loose_spacing() {
        let html = "<p>x</p><script>\r\nwindow.reportData=\t\"data:application/zip;base64,QUJD\"\n</script><p>tail</p>";
        let shell = extract_shell(html).unwrap();
        assert_eq!(shell.payload, "QUJD");
        assert_eq!(shell.template.variable, "reportData");
        assert_eq!(shell.template.before, "<p>x</p>");
        assert_eq!(shell.template.after, "<p>tail</p>");
    }

    #[test]
    fn garbage_payload_does_not_match() {
        let html = "<script>\nwindow.playwrightReportBase64 = \"data:application/zip;base64,QU<b>JD\";</script>";
        assert!(matches!(
            extract_shell(html),
            Err(ShellError::MissingReportData)
        ));
    }

    #[test]
    fn marker_without_newline_does_not_match() {
        let html = "<script>window.playwrightReportBase64 = \"data:application/zip;base64,QUJD\";</script>";
        assert!(extract_shell(html).is_err());
    }

    #[test]
    fn wrong_mime_type_does_not_match() {
        let html = "<script>\nwindow.playwrightReportBase64 = \"data:text/plain;base64,QUJD\";</script>";
        assert!(extract_shell(html).is_err());
    }

    #[test]
    fn decode_payload_rejects_bad_padding() {
        let shell = extract_shell(&playwright_html("QUJ")).unwrap();
        assert!(matches!(
            shell.decode_payload(),
            Err(ShellError::InvalidPayload(_))
        ));
    }

    #[test]
    fn writer_streams_payload_between_fragments() {
        let template = ShellTemplate::new("<html>", "</html>", "playwrightReportBase64");
        let mut w = ShellWriter::begin(Vec::new(), &template).unwrap();
        w.write_all(b"AB").unwrap();
        w.write_all(b"C").unwrap();
        assert_eq!(w.payload_bytes(), 3);
        let html = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            html,
            "<html><script>\nwindow.playwrightReportBase64 = \"data:application/zip;base64,QUJD\";</script></html>"
        );
    }

    #[test]
    fn render_then_extract_roundtrip() {
        let original = playwright_html(&reportmerge_base64::encode(b"archive bytes"));
        let shell = extract_shell(&original).unwrap();
        let bytes = shell.decode_payload().unwrap();
        let rendered = render_shell(&shell.template, &bytes).unwrap();
        assert_eq!(rendered, original);
    }

    #[test]
    fn appending_template_uses_default_variable() {
        let template = ShellTemplate::appending_to("<html></html>");
        insta::assert_snapshot!(
            template.script_open().replace('\n', "\\n"),
            @r#"<script>\nwindow.playwrightReportBase64 = "data:application/zip;base64,"#
        );
    }
}
