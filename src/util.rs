//! Shared utility functions.

/// Convert a slug to title case.
///
/// Splits on `-` and `_`, capitalizes each word.
/// "mixed-models" -> "Mixed Models"
/// "growth_curves" -> "Growth Curves"
pub fn title_case(s: &str) -> String {
    s.split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape HTML special characters for text and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mixed-models"), "Mixed Models");
        assert_eq!(title_case("lgcm"), "Lgcm");
        assert_eq!(title_case("growth_curves"), "Growth Curves");
        assert_eq!(title_case("README"), "README");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<div>&</div>"), "&lt;div&gt;&amp;&lt;/div&gt;");
        assert_eq!(html_escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(html_escape("β₁"), "β₁");
    }
}
