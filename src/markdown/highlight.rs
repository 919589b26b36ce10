use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

use crate::util::html_escape;

/// Syntax highlighting for fenced code (autumnus, tree-sitter based).
///
/// Output uses CSS classes; the matching stylesheet comes from
/// [`SyntaxHighlighter::generate_css`].
pub struct SyntaxHighlighter {
    theme_name: String,
}

impl SyntaxHighlighter {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Highlight code as HTML.
    ///
    /// Blocks without a language, and languages autumnus does not know, come
    /// back as an escaped plain `<pre><code>`.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        if language.is_empty() || language == "text" || language == "plaintext" {
            return plain_code_block(code, language);
        }

        let lang = Language::guess(language, code);
        if matches!(lang, Language::PlainText) {
            tracing::debug!(language, "no grammar for language, emitting plain block");
            return plain_code_block(code, language);
        }

        let Ok(formatter) = HtmlLinkedBuilder::new().source(code).lang(lang).build() else {
            return plain_code_block(code, language);
        };

        let mut output: Vec<u8> = Vec::new();
        if formatter.format(&mut output).is_err() {
            return plain_code_block(code, language);
        }
        String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
    }

    /// Stylesheet for the configured theme, if autumnus knows it.
    pub fn generate_css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false))
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("dracula")
    }
}

fn plain_code_block(code: &str, language: &str) -> String {
    let escaped = html_escape(code);
    if language.is_empty() {
        format!("<pre><code>{escaped}</code></pre>")
    } else {
        format!(
            "<pre><code class=\"language-{}\">{escaped}</code></pre>",
            html_escape(language)
        )
    }
}
