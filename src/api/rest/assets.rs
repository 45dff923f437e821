//! Dashboard page and script

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::utils::{http_date, parse_http_date};
use crate::DEFAULT_GRAPH_NAME;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");
const SCRIPT_JS: &str = include_str!("../../../assets/script.js");

/// GET / - dashboard for every graph
pub async fn index() -> Html<String> {
    render_index(DEFAULT_GRAPH_NAME)
}

/// GET /:name - dashboard for one graph
pub async fn index_for(Path(name): Path<String>) -> Html<String> {
    render_index(&name)
}

fn render_index(name: &str) -> Html<String> {
    Html(INDEX_HTML.replace("{{name}}", &escape_html(name)))
}

/// GET /script.js - served with the server start as its modification time
pub async fn script(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let not_modified = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_http_date)
        .is_some_and(|since| since >= state.started);

    let last_modified = http_date(state.started);
    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::LAST_MODIFIED, last_modified)]).into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8".to_string()),
            (header::LAST_MODIFIED, last_modified),
        ],
        SCRIPT_JS,
    )
        .into_response()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("cpu_1"), "cpu_1");
        assert_eq!(
            escape_html(r#"<b onclick="x">&'"#),
            "&lt;b onclick=&#34;x&#34;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_index_is_templated() {
        let Html(page) = render_index("<cpu>");
        assert!(page.contains(r#"data-graph="&lt;cpu&gt;""#));
        assert!(!page.contains("{{name}}"));
    }
}
