//! 페이로드 서명 (HMAC-SHA256).
//!
//! 공유 키로 본문(압축 전 바이트)의 HMAC을 계산해 hex 문자열로
//! `HashSHA256` 헤더에 싣는다.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::CoreError;

/// 서명 헤더 이름
pub const HASH_HEADER: &str = "HashSHA256";

type HmacSha256 = Hmac<Sha256>;

/// 공유 키 기반 서명기
#[derive(Clone)]
pub struct PayloadSigner {
    key: Vec<u8>,
}

impl PayloadSigner {
    /// 새 서명기 생성
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    /// 설정값에서 생성 (키가 없거나 비어 있으면 서명 비활성)
    pub fn from_key(key: Option<&str>) -> Option<Self> {
        key.filter(|k| !k.is_empty()).map(Self::new)
    }

    fn mac(&self) -> Result<HmacSha256, CoreError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| CoreError::Internal(format!("HMAC 키 초기화 실패: {e}")))
    }

    /// 본문 서명 (hex 소문자)
    pub fn sign(&self, body: &[u8]) -> Result<String, CoreError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 서명 검증 (상수 시간 비교)
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }
}

impl fmt::Debug for PayloadSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}
