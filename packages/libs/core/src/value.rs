//! 동적 값 모델
//!
//! 요청 파라미터와 저장 레코드는 컴파일 타임 스키마 없이 다뤄지므로
//! `Object`/`any` 대신 태그드 유니온으로 표현합니다.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 쓰기 레코드 (컬럼 → 값). 컬럼 순서가 결정적이도록 BTreeMap을 사용합니다.
pub type Record = BTreeMap<String, Value>;

/// 조회 결과 Row
pub type Row = BTreeMap<String, Value>;

/// 요청 파라미터 (키 → 값)
pub type Params = BTreeMap<String, Value>;

/// 타임스탬프 리터럴 포맷
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 동적 값
///
/// JSON 직렬화는 `to_json()`을 거칩니다. 타임스탬프는 `TIMESTAMP_FORMAT` 문자열이 됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// 비어있는지 여부
    ///
    /// NULL, 공백 문자열, 빈 리스트는 "값 없음"으로 취급합니다.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// 문자열 참조
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 정수 변환 (숫자 문자열 포함)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 실수 변환 (숫자 문자열 포함)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// JSON 값으로 변환
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// JSON 객체를 레코드/파라미터 맵으로 변환
    pub fn map_from_json(obj: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, Value> {
        obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                let joined = items
                    .iter()
                    .filter(|v| !matches!(v, Value::Null))
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&joined)
            }
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Text(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(Value::from).collect()),
            // 중첩 객체는 JSON 문자열로 저장
            obj @ serde_json::Value::Object(_) => Value::Text(obj.to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(Value::Null.is_empty());
        assert!(Value::Text("   ".to_string()).is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn test_from_json_keeps_shapes() {
        let json = serde_json::json!({
            "name": "adm",
            "age": 18,
            "score": 1.5,
            "active": true,
            "tags": ["a", "b"],
            "meta": { "k": 1 }
        });
        let serde_json::Value::Object(obj) = json else {
            panic!("expected object");
        };
        let map = Value::map_from_json(obj);

        assert_eq!(map["name"], Value::Text("adm".to_string()));
        assert_eq!(map["age"], Value::Int(18));
        assert_eq!(map["score"], Value::Float(1.5));
        assert_eq!(map["active"], Value::Bool(true));
        assert_eq!(
            map["tags"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(map["meta"], Value::Text("{\"k\":1}".to_string()));
    }

    #[test]
    fn test_display_list_skips_nulls() {
        let list = Value::List(vec![Value::Int(1), Value::Null, Value::from("x")]);
        assert_eq!(list.to_string(), "1,x");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(Value::from("42").as_i64(), Some(42));
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::from("abc").as_i64(), None);
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
    }
}
