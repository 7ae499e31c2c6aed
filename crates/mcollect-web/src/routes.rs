//! 라우트 정의.

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::signature;
use crate::AppState;

/// 전체 라우터 생성
///
/// 레이어 순서 (요청 기준 바깥 → 안): 추적 → 응답 압축 → 요청 해제 → 서명.
/// 서명은 압축 해제된 본문 기준으로 검증하고, 압축 전 응답 본문에 붙인다.
/// 클라이언트가 gzip을 받으면 크기와 무관하게 모든 응답을 압축한다.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::listing::list_metrics))
        .route(
            "/update/{kind}/{id}/{value}",
            post(handlers::update::update_from_path),
        )
        .route("/update/", post(handlers::update::update_json))
        .route("/updates/", post(handlers::update::update_batch))
        .route("/value/{kind}/{id}", get(handlers::value::get_value))
        .route("/value/", post(handlers::value::query_value));

    // 영속 백엔드일 때만 생존 확인 노출
    if state.store.is_durable() {
        router = router.route("/ping", get(handlers::ping::ping));
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            signature::verify_and_sign,
        ))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new().compress_when(SizeAbove::new(0)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
