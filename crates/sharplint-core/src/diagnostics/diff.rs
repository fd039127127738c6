//! Unified diff rendering for dry-run previews

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Renders line diffs between original and fixed file contents
#[derive(Debug, Clone)]
pub struct DiffRenderer {
    use_colors: bool,
    context_lines: usize,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            context_lines: 3,
        }
    }

    pub fn no_colors() -> Self {
        Self {
            use_colors: false,
            ..Self::new()
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Render a unified diff with `---`/`+++` headers and hunks
    pub fn render_unified(&self, path: &str, original: &str, modified: &str) -> String {
        let diff = TextDiff::from_lines(original, modified);
        let mut output = String::new();
        if diff.ratio() >= 1.0 {
            return output;
        }

        output.push_str(&self.paint_header(&format!("--- {path}\n")));
        output.push_str(&self.paint_header(&format!("+++ {path}\n")));

        for group in diff.grouped_ops(self.context_lines) {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };
            let old_start = first.old_range().start;
            let new_start = first.new_range().start;
            let old_len = last.old_range().end - old_start;
            let new_len = last.new_range().end - new_start;
            output.push_str(&self.paint_hunk(&format!(
                "@@ -{},{} +{},{} @@\n",
                old_start + 1,
                old_len,
                new_start + 1,
                new_len
            )));

            for op in &group {
                for change in diff.iter_changes(op) {
                    let (sign, line) = match change.tag() {
                        ChangeTag::Delete => ("-", change.value()),
                        ChangeTag::Insert => ("+", change.value()),
                        ChangeTag::Equal => (" ", change.value()),
                    };
                    let mut rendered = format!("{sign}{line}");
                    if !rendered.ends_with('\n') {
                        rendered.push('\n');
                    }
                    output.push_str(&self.paint_change(change.tag(), &rendered));
                }
            }
        }

        output
    }

    fn paint_header(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_hunk(&self, text: &str) -> String {
        if self.use_colors {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_change(&self, tag: ChangeTag, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match tag {
            ChangeTag::Delete => text.red().to_string(),
            ChangeTag::Insert => text.green().to_string(),
            ChangeTag::Equal => text.to_string(),
        }
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff() {
        let original = "a\nthrow new E(\"p\");\nb\n";
        let modified = "a\nthrow new E(nameof(p));\nb\n";
        let diff = DiffRenderer::no_colors().render_unified("C.cs", original, modified);

        assert!(diff.starts_with("--- C.cs\n+++ C.cs\n@@ -1,3 +1,3 @@\n"));
        assert!(diff.contains("-throw new E(\"p\");\n"));
        assert!(diff.contains("+throw new E(nameof(p));\n"));
        assert!(diff.contains(" a\n"));
    }

    #[test]
    fn test_identical_inputs_render_nothing() {
        assert!(DiffRenderer::no_colors().render_unified("C.cs", "x\n", "x\n").is_empty());
    }
}
