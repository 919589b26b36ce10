//! LaTeX rendering through KaTeX.

#[derive(thiserror::Error, Debug)]
pub enum MathError {
    #[error("invalid KaTeX options: {0}")]
    Options(String),

    #[error("{0}")]
    Katex(#[from] katex::Error),
}

/// Render a LaTeX expression (without delimiters) to KaTeX HTML.
///
/// Parse errors are returned rather than rendered inline, so the caller
/// decides how a broken formula looks.
pub fn render_latex(tex: &str, display: bool) -> Result<String, MathError> {
    let opts = katex::Opts::builder()
        .display_mode(display)
        .throw_on_error(true)
        .build()
        .map_err(|e| MathError::Options(e.to_string()))?;

    Ok(katex::render_with_opts(tex, &opts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greek_with_subscript() {
        let html = render_latex("\\beta_1", false).unwrap();
        assert!(html.starts_with("<span class=\"katex\">"));
        assert!(html.contains("β"));
        assert!(html.contains("<annotation encoding=\"application/x-tex\">\\beta_1</annotation>"));
    }

    #[test]
    fn test_display_mode() {
        let html = render_latex("\\frac{a}{b}", true).unwrap();
        assert!(html.contains("katex-display"));
    }

    #[test]
    fn test_underbrace_and_matrices() {
        assert!(render_latex("\\underbrace{a+b}_{n}", false).is_ok());
        assert!(render_latex("\\begin{pmatrix} 1 & 0 \\\\ 0 & 1 \\end{pmatrix}", true).is_ok());
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        assert!(render_latex("\\nosuch{x}", false).is_err());
    }
}
