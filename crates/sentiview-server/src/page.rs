//! HTML page rendering

use axum::response::Html;
use rust_embed::Embed;
use std::borrow::Cow;

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

const RESULT_PLACEHOLDER: &str = "{{result}}";

/// What the page shows below the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub label: i64,
    pub display_name: Option<String>,
}

/// Render the input page, with a prediction block when `result` is set
pub fn render(result: Option<&ResultView>) -> Html<String> {
    let template = template();
    let block = result.map(result_block).unwrap_or_default();
    Html(template.replace(RESULT_PLACEHOLDER, &block))
}

fn template() -> Cow<'static, str> {
    match <Templates as Embed>::get("index.html") {
        Some(file) => Cow::Owned(String::from_utf8_lossy(&file.data).into_owned()),
        None => Cow::Borrowed(FALLBACK_HTML),
    }
}

fn result_block(result: &ResultView) -> String {
    match &result.display_name {
        Some(name) => format!(
            r#"<div class="result"><p>Predicted sentiment: <span class="label">{}</span> (class {})</p></div>"#,
            escape_html(name),
            result.label
        ),
        None => format!(
            r#"<div class="result"><p>Predicted sentiment: <span class="label">{}</span></p></div>"#,
            result.label
        ),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sentiment Analysis</title>
</head>
<body>
    <h1>Sentiment Analysis</h1>
    <form action="/predict" method="post">
        <textarea name="text"></textarea>
        <button type="submit">Predict</button>
    </form>
    {{result}}
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_result() {
        let Html(page) = render(None);
        assert!(page.contains("<title>Sentiment Analysis</title>"));
        assert!(page.contains(r#"name="text""#));
        assert!(!page.contains(RESULT_PLACEHOLDER));
        assert!(!page.contains("Predicted sentiment"));
    }

    #[test]
    fn test_render_with_display_name() {
        let Html(page) = render(Some(&ResultView {
            label: 1,
            display_name: Some("positive".to_string()),
        }));
        assert!(page.contains("Predicted sentiment"));
        assert!(page.contains(">positive</span> (class 1)"));
    }

    #[test]
    fn test_render_bare_label() {
        let Html(page) = render(Some(&ResultView {
            label: 0,
            display_name: None,
        }));
        assert!(page.contains(r#"<span class="label">0</span>"#));
    }

    #[test]
    fn test_display_name_is_escaped() {
        let Html(page) = render(Some(&ResultView {
            label: 1,
            display_name: Some("<b>good</b>".to_string()),
        }));
        assert!(page.contains("&lt;b&gt;good&lt;/b&gt;"));
        assert!(!page.contains("<b>good</b>"));
    }

    #[test]
    fn test_fallback_has_placeholder() {
        assert!(FALLBACK_HTML.contains(RESULT_PLACEHOLDER));
    }
}
