//! `HashSHA256` 서명 미들웨어.
//!
//! 키가 설정된 경우:
//! - POST 요청 본문(압축 해제 후)의 서명이 없거나 틀리면 400으로 거부
//! - 모든 응답 본문(압축 전)에 서명 헤더를 붙임

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use mcollect_core::signing::{PayloadSigner, HASH_HEADER};
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::AppState;

/// 서명 검증 시 버퍼링할 최대 본문 크기
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// 응답 헤더 이름 (HTTP 헤더 이름은 소문자로 정규화됨)
const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("hashsha256");

/// 요청 서명 검증 + 응답 서명
pub async fn verify_and_sign(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(signer) = state.signer else {
        return next.run(request).await;
    };

    let request = if request.method() == Method::POST {
        match verify_request(&signer, request).await {
            Ok(request) => request,
            Err(e) => return sign_response(&signer, e.into_response()).await,
        }
    } else {
        request
    };

    let response = next.run(request).await;
    sign_response(&signer, response).await
}

/// 본문을 버퍼링해 서명 확인 후 요청 재구성
async fn verify_request(signer: &PayloadSigner, request: Request) -> Result<Request, ApiError> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("본문 읽기 실패: {e}")))?;

    let Some(signature) = parts
        .headers
        .get(HASH_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        warn!("서명 헤더 누락: {} {}", parts.method, parts.uri);
        return Err(ApiError::BadRequest(format!("{HASH_HEADER} 헤더 누락")));
    };

    if !signer.verify(&bytes, signature) {
        warn!("서명 불일치: {} {}", parts.method, parts.uri);
        return Err(ApiError::BadRequest("서명 불일치".to_string()));
    }

    debug!("서명 확인: {} {}", parts.method, parts.uri);
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

/// 응답 본문 서명 후 헤더 추가
async fn sign_response(signer: &PayloadSigner, response: Response) -> Response {
    let (mut parts, body) = response.into_parts();

    let bytes: Bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("응답 본문 읽기 실패: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match signer.sign(&bytes) {
        Ok(sig) => match HeaderValue::from_str(&sig) {
            Ok(value) => {
                parts.headers.insert(SIGNATURE_HEADER, value);
            }
            Err(e) => error!("서명 헤더 생성 실패: {e}"),
        },
        Err(e) => error!("응답 서명 실패: {e}"),
    }

    Response::from_parts(parts, Body::from(bytes))
}
