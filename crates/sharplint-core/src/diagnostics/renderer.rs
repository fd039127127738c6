//! Diagnostic renderer with rich terminal output

use colored::Colorize;
use std::fs;

use super::{Applicability, CodeSuggestion, Diagnostic, Location, Severity};

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text with code frames
    Text,
    /// JSON format for programmatic consumption
    Json,
    /// JSON with pretty-printing
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Red,
    Yellow,
    Blue,
    Green,
    Dim,
    Bold,
}

/// Diagnostic renderer with code frames and suggestion previews
#[derive(Debug, Clone)]
pub struct DiagnosticRenderer {
    use_colors: bool,
    output_format: OutputFormat,
}

impl DiagnosticRenderer {
    /// Text renderer with colors
    pub fn new() -> Self {
        Self {
            use_colors: true,
            output_format: OutputFormat::Text,
        }
    }

    pub fn no_colors() -> Self {
        Self {
            use_colors: false,
            output_format: OutputFormat::Text,
        }
    }

    pub fn with_format(format: OutputFormat) -> Self {
        Self {
            use_colors: format == OutputFormat::Text,
            output_format: format,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors && self.output_format == OutputFormat::Text;
        self
    }

    /// Render a diagnostic, reading the source file for the code frame
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let source = fs::read_to_string(&diagnostic.location.file).ok();
        self.render_with_source(diagnostic, source.as_deref())
    }

    /// Render a diagnostic against already loaded source text
    pub fn render_with_source(&self, diagnostic: &Diagnostic, source: Option<&str>) -> String {
        match self.output_format {
            OutputFormat::Text => self.render_text(diagnostic, source),
            OutputFormat::Json => self.render_json(std::slice::from_ref(diagnostic), false),
            OutputFormat::JsonPretty => self.render_json(std::slice::from_ref(diagnostic), true),
        }
    }

    /// Render multiple diagnostics
    pub fn render_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        match self.output_format {
            OutputFormat::Text => {
                let mut output = String::new();
                for (i, diagnostic) in diagnostics.iter().enumerate() {
                    if i > 0 {
                        output.push('\n');
                    }
                    output.push_str(&self.render(diagnostic));
                }
                output
            }
            OutputFormat::Json => self.render_json(diagnostics, false),
            OutputFormat::JsonPretty => self.render_json(diagnostics, true),
        }
    }

    fn render_text(&self, diagnostic: &Diagnostic, source: Option<&str>) -> String {
        let mut output = String::new();

        output.push_str(&self.render_header(diagnostic));
        output.push('\n');

        match source.and_then(|source| self.render_code_frame(diagnostic, source)) {
            Some(frame) => output.push_str(&frame),
            None => {
                output.push_str(&self.render_location_line(&diagnostic.location));
                output.push('\n');
            }
        }

        for suggestion in &diagnostic.suggestions {
            output.push_str(&self.render_suggestion(suggestion, source));
        }

        output
    }

    fn render_json(&self, diagnostics: &[Diagnostic], pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(diagnostics)
        } else {
            serde_json::to_string(diagnostics)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
    }

    fn render_header(&self, diagnostic: &Diagnostic) -> String {
        let tone = severity_tone(diagnostic.severity);
        format!(
            "{}{}: {}",
            self.paint(&diagnostic.severity.to_string(), tone),
            self.paint(&format!("[{}]", diagnostic.rule_id), Tone::Dim),
            self.paint(&diagnostic.message, Tone::Bold)
        )
    }

    fn render_code_frame(&self, diagnostic: &Diagnostic, source: &str) -> Option<String> {
        let lines: Vec<&str> = source.lines().collect();
        let location = &diagnostic.location;
        if location.line == 0 || location.line > lines.len() {
            return None;
        }

        let start_line = location.line.saturating_sub(1).max(1);
        let end_line = (location.line + 1).min(lines.len());
        let gutter = end_line.to_string().len();
        let tone = severity_tone(diagnostic.severity);

        let mut frame = String::new();
        frame.push_str(&format!(
            "  {}─[{}]\n",
            self.paint("┌", Tone::Blue),
            location
        ));

        for line_num in start_line..=end_line {
            let content = lines.get(line_num - 1)?;
            let is_error_line = line_num == location.line;
            let marker = if is_error_line {
                self.paint(">", tone)
            } else {
                " ".to_string()
            };
            frame.push_str(&format!(
                "{marker} {}{}{content}\n",
                self.paint(&format!("{line_num:>gutter$}"), Tone::Dim),
                self.paint(" │ ", Tone::Dim),
            ));

            if is_error_line {
                let width = match (location.end_line, location.end_column) {
                    (Some(end_line), Some(end_column)) if end_line == location.line => {
                        end_column.saturating_sub(location.column)
                    }
                    _ => content.chars().count().saturating_sub(location.column - 1),
                };
                frame.push_str(&format!(
                    "  {}{}{}{}\n",
                    " ".repeat(gutter),
                    self.paint(" │ ", Tone::Dim),
                    " ".repeat(location.column.saturating_sub(1)),
                    self.paint(&"^".repeat(width.max(1)), tone)
                ));
            }
        }

        Some(frame)
    }

    fn render_suggestion(&self, suggestion: &CodeSuggestion, source: Option<&str>) -> String {
        let (label, tone) = match suggestion.applicability {
            Applicability::Always => ("Safe fix", Tone::Green),
            Applicability::MaybeIncorrect => ("Unsafe fix", Tone::Yellow),
        };

        let mut output = format!(
            "  {} {}: {}\n",
            self.paint("i", Tone::Blue),
            self.paint(label, tone),
            suggestion.message
        );

        if let Some((before, after)) = source.and_then(|source| preview_lines(suggestion, source)) {
            let line = suggestion.location.line;
            output.push_str(&format!(
                "    {} │ {}\n",
                self.paint(&format!("{line:>4}"), Tone::Dim),
                self.paint(&format!("- {before}"), Tone::Red)
            ));
            output.push_str(&format!(
                "    {} │ {}\n",
                self.paint(&format!("{line:>4}"), Tone::Dim),
                self.paint(&format!("+ {after}"), Tone::Green)
            ));
        }

        output
    }

    fn render_location_line(&self, location: &Location) -> String {
        format!(
            "  {} {}",
            self.paint("→", Tone::Blue),
            self.paint(&location.to_string(), Tone::Dim)
        )
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match tone {
            Tone::Red => text.red().to_string(),
            Tone::Yellow => text.yellow().to_string(),
            Tone::Blue => text.blue().to_string(),
            Tone::Green => text.green().to_string(),
            Tone::Dim => text.dimmed().to_string(),
            Tone::Bold => text.bold().to_string(),
        }
    }
}

impl Default for DiagnosticRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_tone(severity: Severity) -> Tone {
    match severity {
        Severity::Error => Tone::Red,
        Severity::Warning => Tone::Yellow,
        Severity::Info => Tone::Blue,
        Severity::Hint => Tone::Dim,
    }
}

/// The source line holding the suggestion, before and after the replacement
///
/// Multi-line replacements have no single-line preview.
fn preview_lines(suggestion: &CodeSuggestion, source: &str) -> Option<(String, String)> {
    let range = suggestion.location.byte_range();
    if range.end > source.len() || suggestion.replacement.contains('\n') {
        return None;
    }
    let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[range.end..]
        .find('\n')
        .map_or(source.len(), |i| range.end + i);
    let before = source.get(line_start..line_end)?;
    if before.contains('\n') {
        return None;
    }
    let after = format!(
        "{}{}{}",
        source.get(line_start..range.start)?,
        suggestion.replacement,
        source.get(range.end..line_end)?
    );
    Some((before.trim_end_matches('\r').to_string(), after.trim_end_matches('\r').to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SourceMap;
    use std::path::Path;

    fn sample() -> (String, Diagnostic) {
        let source = "class C\n{\n    void M(string p) { if (p == null) throw new E(\"p\"); }\n}\n"
            .to_string();
        let start = source.find("\"p\"").unwrap();
        let map = SourceMap::new(&source);
        let location = map.span_to_location(start..start + 3, &source, Path::new("C.cs"));
        let diagnostic = Diagnostic::new(
            "readability/prefer-nameof",
            Severity::Info,
            "String literal 'p' can be replaced with a self-reference to p",
            location.clone(),
        )
        .with_suggestion(CodeSuggestion::safe(
            "Replace string with nameof expression",
            "nameof(p)",
            location,
        ));
        (source, diagnostic)
    }

    #[test]
    fn test_text_rendering_has_frame_and_preview() {
        let (source, diagnostic) = sample();
        let output = DiagnosticRenderer::no_colors().render_with_source(&diagnostic, Some(&source));

        assert!(output.starts_with("info[readability/prefer-nameof]: String literal 'p'"));
        assert!(output.contains("> 3 │ "));
        assert!(output.contains("^^^"));
        assert!(output.contains("Safe fix: Replace string with nameof expression"));
        assert!(output.contains("+     void M(string p) { if (p == null) throw new E(nameof(p)); }"));
    }

    #[test]
    fn test_missing_source_falls_back_to_location() {
        let (_, diagnostic) = sample();
        let output = DiagnosticRenderer::no_colors().render_with_source(&diagnostic, None);
        assert!(output.contains("→ C.cs:3:"));
    }

    #[test]
    fn test_json_rendering() {
        let (_, diagnostic) = sample();
        let output = DiagnosticRenderer::with_format(OutputFormat::Json).render_with_source(&diagnostic, None);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["rule_id"], "readability/prefer-nameof");
        assert_eq!(value[0]["severity"], "info");
    }
}
