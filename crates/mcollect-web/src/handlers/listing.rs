//! HTML 목록 핸들러.

use axum::extract::State;
use axum::response::Html;
use std::fmt::Write;

use crate::error::ApiError;
use crate::AppState;

/// HTML 특수문자 이스케이프
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `GET /`: 전체 gauge/counter 목록 (이름순)
pub async fn list_metrics(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let gauges = state.store.get_all_gauges().await?;
    let counters = state.store.get_all_counters().await?;

    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Metrics</title></head>\n<body>\n",
    );

    html.push_str("<h2>Gauges</h2>\n<ul>\n");
    for (name, value) in &gauges {
        let _ = writeln!(html, "<li>{}: {}</li>", escape(name), value);
    }
    html.push_str("</ul>\n<h2>Counters</h2>\n<ul>\n");
    for (name, delta) in &counters {
        let _ = writeln!(html, "<li>{}: {}</li>", escape(name), delta);
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    Ok(Html(html))
}
