//! 메트릭 조회 핸들러.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use mcollect_core::error::CoreError;
use mcollect_core::models::{MetricKind, MetricRecord};
use serde::Deserialize;

use super::parse_json;
use crate::error::ApiError;
use crate::AppState;

/// `POST /value/` 요청 본문
#[derive(Debug, Deserialize)]
pub struct MetricQuery {
    /// 메트릭 이름
    pub id: String,
    /// 메트릭 종류
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

/// 종류까지 일치하는 레코드 조회 (종류가 다르면 미발견)
async fn lookup(state: &AppState, kind: &str, id: &str) -> Result<MetricRecord, ApiError> {
    let kind = MetricKind::parse(kind)?;
    if id.is_empty() {
        return Err(CoreError::MetricNotFound(id.to_string()).into());
    }

    let record = state.store.get_metric(id).await?;
    if record.kind != kind {
        return Err(CoreError::MetricNotFound(format!("{id} ({kind})")).into());
    }
    Ok(record)
}

/// `GET /value/{type}/{name}`: 일반 텍스트 값
pub async fn get_value(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let record = lookup(&state, &kind, &id).await?;
    Ok(record.render_value())
}

/// `POST /value/`: JSON 조회
pub async fn query_value(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MetricRecord>, ApiError> {
    let query: MetricQuery = parse_json(&body)?;
    let record = lookup(&state, query.kind.as_str(), &query.id).await?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_string, get, post, post_json, test_router};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn gauge_value_is_shortest_decimal() {
        let (router, _) = test_router();
        router
            .clone()
            .oneshot(post("/update/gauge/Alloc/123.45"))
            .await
            .unwrap();

        let resp = router.oneshot(get("/value/gauge/Alloc")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "123.45");
    }

    #[tokio::test]
    async fn counter_accumulates_across_requests() {
        let (router, _) = test_router();
        for _ in 0..2 {
            let resp = router
                .clone()
                .oneshot(post("/update/counter/PollCount/1"))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = router.oneshot(get("/value/counter/PollCount")).await.unwrap();
        assert_eq!(body_string(resp).await, "2");
    }

    #[tokio::test]
    async fn lookup_errors() {
        let (router, _) = test_router();
        router
            .clone()
            .oneshot(post("/update/counter/Hits/5"))
            .await
            .unwrap();

        for (uri, status) in [
            ("/value/gauge/Missing", StatusCode::NOT_FOUND),
            ("/value/gauge/Hits", StatusCode::NOT_FOUND),
            ("/value/histogram/Hits", StatusCode::BAD_REQUEST),
        ] {
            let resp = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), status, "{uri}");
        }
    }

    #[tokio::test]
    async fn json_lookup() {
        let (router, _) = test_router();
        router
            .clone()
            .oneshot(post("/update/gauge/Load/0.5"))
            .await
            .unwrap();

        let resp = router
            .clone()
            .oneshot(post_json("/value/", r#"{"id":"Load","type":"gauge"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_string(resp).await,
            r#"{"id":"Load","type":"gauge","value":0.5}"#
        );

        let resp = router
            .oneshot(post_json("/value/", r#"{"id":"Nope","type":"counter"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["status"], 404);
        assert!(json["error"].as_str().unwrap().contains("Nope"));
    }
}
