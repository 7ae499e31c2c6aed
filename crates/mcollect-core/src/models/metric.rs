//! 메트릭 레코드 모델.
//!
//! gauge(f64) / counter(i64) 태그 유니온. 와이어 형식:
//! `{"id": string, "type": "gauge"|"counter", "value"?: f64, "delta"?: i64}`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// id → 레코드 매핑
pub type MetricSet = BTreeMap<String, MetricRecord>;

/// 메트릭 종류
///
/// 알 수 없는 타입 문자열도 역직렬화는 허용하고 (`Other`),
/// 검증 단계에서 `InvalidMetricType`으로 거부한다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricKind {
    /// 마지막 값 유지
    Gauge,
    /// 누적
    Counter,
    /// 미지원 타입
    Other(String),
}

impl MetricKind {
    /// 와이어 문자열
    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Other(s) => s.as_str(),
        }
    }

    /// 지원 타입만 허용하는 파싱
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match MetricKind::from(raw.to_string()) {
            MetricKind::Other(s) => Err(CoreError::InvalidMetricType(s)),
            kind => Ok(kind),
        }
    }
}

impl From<String> for MetricKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "gauge" => MetricKind::Gauge,
            "counter" => MetricKind::Counter,
            _ => MetricKind::Other(s),
        }
    }
}

impl From<MetricKind> for String {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 메트릭 레코드 (교환 단위)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// 메트릭 이름 (저장소 내 고유 키)
    pub id: String,
    /// 메트릭 종류
    #[serde(rename = "type")]
    pub kind: MetricKind,
    /// gauge 값 (gauge 전용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// counter 증분 (counter 전용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl MetricRecord {
    /// gauge 레코드 생성
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge,
            value: Some(value),
            delta: None,
        }
    }

    /// counter 레코드 생성
    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter,
            value: None,
            delta: Some(delta),
        }
    }

    /// URL 경로 세그먼트(`/update/{type}/{name}/{value}`)에서 레코드 생성
    pub fn parse(kind: &str, id: &str, raw: &str) -> Result<Self, CoreError> {
        let kind = MetricKind::parse(kind)?;
        let record = match kind {
            MetricKind::Gauge => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| CoreError::InvalidGaugeValue(raw.to_string()))?;
                Self::gauge(id, value)
            }
            MetricKind::Counter => {
                let delta: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| CoreError::InvalidCounterValue(raw.to_string()))?;
                Self::counter(id, delta)
            }
            MetricKind::Other(s) => return Err(CoreError::InvalidMetricType(s)),
        };
        record.validate()?;
        Ok(record)
    }

    /// 레코드 형태 검증
    ///
    /// 종류에 맞는 필드 하나만 채워져 있어야 한다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.is_empty() {
            return Err(CoreError::MetricNotFound("(빈 이름)".to_string()));
        }

        match &self.kind {
            MetricKind::Gauge => match (self.value, self.delta) {
                (Some(v), None) if v.is_finite() => Ok(()),
                (Some(v), None) => Err(CoreError::InvalidGaugeValue(format!(
                    "{}: 유한하지 않은 값 {v}",
                    self.id
                ))),
                (None, _) => Err(CoreError::InvalidGaugeValue(format!(
                    "{}: value 누락",
                    self.id
                ))),
                (Some(_), Some(_)) => Err(CoreError::InvalidGaugeValue(format!(
                    "{}: gauge에 delta 지정됨",
                    self.id
                ))),
            },
            MetricKind::Counter => match (self.value, self.delta) {
                (None, Some(_)) => Ok(()),
                (_, None) => Err(CoreError::InvalidCounterValue(format!(
                    "{}: delta 누락",
                    self.id
                ))),
                (Some(_), Some(_)) => Err(CoreError::InvalidCounterValue(format!(
                    "{}: counter에 value 지정됨",
                    self.id
                ))),
            },
            MetricKind::Other(s) => Err(CoreError::InvalidMetricType(s.clone())),
        }
    }

    /// 일반 텍스트 값 표현 (`GET /value/...` 응답)
    ///
    /// gauge는 왕복 가능한 최단 십진수 (`123.45`, `1`), counter는 정수.
    pub fn render_value(&self) -> String {
        match (&self.kind, self.value, self.delta) {
            (MetricKind::Gauge, Some(v), _) => v.to_string(),
            (MetricKind::Counter, _, Some(d)) => d.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_gauge() {
        let json = serde_json::to_string(&MetricRecord::gauge("Alloc", 1.5)).unwrap();
        assert_eq!(json, r#"{"id":"Alloc","type":"gauge","value":1.5}"#);
    }

    #[test]
    fn wire_format_counter() {
        let json = serde_json::to_string(&MetricRecord::counter("PollCount", 7)).unwrap();
        assert_eq!(json, r#"{"id":"PollCount","type":"counter","delta":7}"#);
    }

    #[test]
    fn unknown_type_deserializes_then_fails_validation() {
        let record: MetricRecord =
            serde_json::from_str(r#"{"id":"x","type":"histogram","value":1.0}"#).unwrap();
        assert_eq!(record.kind, MetricKind::Other("histogram".to_string()));
        assert!(matches!(
            record.validate(),
            Err(CoreError::InvalidMetricType(t)) if t == "histogram"
        ));
    }

    #[test]
    fn wrong_field_for_kind_is_rejected() {
        let record: MetricRecord =
            serde_json::from_str(r#"{"id":"x","type":"gauge","delta":3}"#).unwrap();
        assert!(matches!(
            record.validate(),
            Err(CoreError::InvalidGaugeValue(_))
        ));

        let record: MetricRecord =
            serde_json::from_str(r#"{"id":"y","type":"counter","value":3.0}"#).unwrap();
        assert!(matches!(
            record.validate(),
            Err(CoreError::InvalidCounterValue(_))
        ));

        let both = MetricRecord {
            id: "z".to_string(),
            kind: MetricKind::Counter,
            value: Some(1.0),
            delta: Some(1),
        };
        assert!(both.validate().is_err());
    }

    #[test]
    fn non_finite_gauge_is_rejected() {
        assert!(MetricRecord::gauge("g", f64::NAN).validate().is_err());
        assert!(MetricRecord::gauge("g", f64::INFINITY).validate().is_err());
        assert!(MetricRecord::gauge("g", -0.25).validate().is_ok());
    }

    #[test]
    fn empty_id_is_not_found() {
        assert!(matches!(
            MetricRecord::gauge("", 1.0).validate(),
            Err(CoreError::MetricNotFound(_))
        ));
    }

    #[test]
    fn parse_path_segments() {
        assert_eq!(
            MetricRecord::parse("gauge", "Alloc", "123.45").unwrap(),
            MetricRecord::gauge("Alloc", 123.45)
        );
        assert_eq!(
            MetricRecord::parse("counter", "PollCount", "1").unwrap(),
            MetricRecord::counter("PollCount", 1)
        );
        assert!(matches!(
            MetricRecord::parse("gauge", "Alloc", "abc"),
            Err(CoreError::InvalidGaugeValue(_))
        ));
        assert!(matches!(
            MetricRecord::parse("counter", "PollCount", "1.5"),
            Err(CoreError::InvalidCounterValue(_))
        ));
        assert!(matches!(
            MetricRecord::parse("summary", "x", "1"),
            Err(CoreError::InvalidMetricType(_))
        ));
    }

    #[test]
    fn render_value_formats() {
        assert_eq!(MetricRecord::gauge("a", 123.45).render_value(), "123.45");
        assert_eq!(MetricRecord::gauge("a", 1.0).render_value(), "1");
        assert_eq!(MetricRecord::gauge("a", 0.1).render_value(), "0.1");
        assert_eq!(MetricRecord::counter("c", -42).render_value(), "-42");
    }

    #[test]
    fn metric_set_is_keyed_by_id() {
        let mut set = MetricSet::new();
        set.insert("a".to_string(), MetricRecord::gauge("a", 1.0));
        set.insert("a".to_string(), MetricRecord::gauge("a", 2.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set["a"].value, Some(2.0));
    }
}
