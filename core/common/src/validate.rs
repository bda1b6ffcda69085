//! モデル出力の検証・正規化
//!
//! 型の緩い JSON から検証済みレコードへの純粋関数。入力が壊れていても panic も Err もせず、
//! 欠けたフィールドは既定値で埋める。Err を返すのは [`parse_model_json`] だけで、
//! これはフォールバックチェーンが「次のモデルへ進む」判定に使う。

use crate::domain::event::{MAX_EVENT_SCORE, MIN_EVENT_SCORE};
use crate::domain::post::MAX_POST_SCORE;
use crate::domain::{Event, ModelName, Post, TeamMember, TokenUsage};
use crate::error::Error;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::OnceLock;

const UNKNOWN_LOCATION: &str = "Unknown";

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
    })
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// モデルの content 文字列を JSON オブジェクトとして解釈する
///
/// ```json ... ``` で囲まれていれば中身を取り出す。オブジェクト以外は Validation エラー。
pub fn parse_model_json(content: &str) -> Result<Map<String, Value>, Error> {
    let trimmed = content.trim();
    let body = code_fence()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::json(format!("Model content is not valid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::validation(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// 整数への変換（数値は 0 方向へ切り捨て、文字列は整数として parse）
pub fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn clamp_score(v: i64, min: u8, max: u8) -> u8 {
    v.clamp(i64::from(min), i64::from(max)) as u8
}

fn sanitize_team(raw: &Map<String, Value>) -> Vec<TeamMember> {
    let Some(entries) = raw.get("team_details").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| entry.as_object())
        .map(|member| TeamMember {
            name: string_field(member, "name").unwrap_or_default(),
            custom_name: string_field(member, "custom_name").unwrap_or_default(),
            health: string_field(member, "health").unwrap_or_default(),
        })
        .collect()
}

/// 解析レスポンスを Event に正規化する
///
/// - 未知のフィールドは捨てる
/// - score は整数化して [1,10] に丸める（範囲外は拒否せずクランプ）。変換できなければ 1
/// - team_details はオブジェクト以外の要素を落とし、各文字列は既定で空
pub fn sanitize_event(
    raw: &Map<String, Value>,
    image_path: &Path,
    timestamp: DateTime<Utc>,
    model: ModelName,
    token_usage: TokenUsage,
) -> Event {
    let score = raw
        .get("score")
        .and_then(coerce_int)
        .map(|s| clamp_score(s, MIN_EVENT_SCORE, MAX_EVENT_SCORE))
        .unwrap_or(MIN_EVENT_SCORE);

    Event {
        image_path: image_path.to_path_buf(),
        timestamp,
        model: Some(model),
        detailed_summary: string_field(raw, "detailed_summary").unwrap_or_default(),
        team_details: sanitize_team(raw),
        score,
        estimated_location: string_field(raw, "estimated_location")
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        token_usage,
    }
}

/// 投稿判定レスポンスを Post に正規化する
///
/// - commentary: 文字列でなければ空
/// - score: 整数化して [0,10] にクランプ。変換できなければ 0
/// - post: bool 以外は false
/// - image_id: 非負の整数のみ。それ以外は null
pub fn sanitize_post(
    raw: &Map<String, Value>,
    timestamp: DateTime<Utc>,
    model: ModelName,
    token_usage: TokenUsage,
) -> Post {
    let score = raw
        .get("score")
        .and_then(coerce_int)
        .map(|s| clamp_score(s, 0, MAX_POST_SCORE))
        .unwrap_or(0);
    let image_id = raw
        .get("image_id")
        .and_then(|v| v.as_u64())
        .and_then(|id| u32::try_from(id).ok());

    Post {
        timestamp,
        model: Some(model),
        commentary: string_field(raw, "commentary").unwrap_or_default(),
        score,
        post: raw.get("post").and_then(|v| v.as_bool()).unwrap_or(false),
        image_id,
        token_usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn event_from(v: Value) -> Event {
        sanitize_event(
            &obj(v),
            Path::new("img.png"),
            ts(),
            ModelName::new("m"),
            TokenUsage::default(),
        )
    }

    fn post_from(v: Value) -> Post {
        sanitize_post(&obj(v), ts(), ModelName::new("m"), TokenUsage::default())
    }

    #[test]
    fn test_parse_model_json_plain_object() {
        let map = parse_model_json(r#"{"score": 3}"#).unwrap();
        assert_eq!(map["score"], 3);
    }

    #[test]
    fn test_parse_model_json_unwraps_code_fence() {
        let content = "```json\n{\"detailed_summary\": \"hi\"}\n```";
        let map = parse_model_json(content).unwrap();
        assert_eq!(map["detailed_summary"], "hi");
    }

    #[test]
    fn test_parse_model_json_rejects_non_object() {
        let err = parse_model_json("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = parse_model_json("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int(&json!(7)), Some(7));
        assert_eq!(coerce_int(&json!(7.9)), Some(7));
        assert_eq!(coerce_int(&json!(-2.5)), Some(-2));
        assert_eq!(coerce_int(&json!(" 4 ")), Some(4));
        assert_eq!(coerce_int(&json!("4.5")), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&Value::Null), None);
    }

    #[test]
    fn test_sanitize_event_full_response() {
        let ev = event_from(json!({
            "detailed_summary": "Claude is battling Brock.",
            "team_details": [{"name": "Charmander", "custom_name": "Flamey", "health": "low"}],
            "score": 8,
            "estimated_location": "Pewter Gym",
            "extra": "dropped"
        }));
        assert_eq!(ev.detailed_summary, "Claude is battling Brock.");
        assert_eq!(ev.team_details.len(), 1);
        assert_eq!(ev.team_details[0].health, "low");
        assert_eq!(ev.score, 8);
        assert_eq!(ev.estimated_location, "Pewter Gym");
        assert_eq!(ev.model, Some(ModelName::new("m")));
        let v = serde_json::to_value(&ev).unwrap();
        assert!(v.get("extra").is_none());
    }

    #[test]
    fn test_sanitize_event_clamps_score() {
        assert_eq!(event_from(json!({"score": 42})).score, 10);
        assert_eq!(event_from(json!({"score": -3})).score, 1);
        assert_eq!(event_from(json!({"score": 0})).score, 1);
        assert_eq!(event_from(json!({"score": "6"})).score, 6);
        assert_eq!(event_from(json!({"score": "high"})).score, 1);
    }

    #[test]
    fn test_sanitize_event_defaults_missing_fields() {
        let ev = event_from(json!({}));
        assert_eq!(ev.detailed_summary, "");
        assert!(ev.team_details.is_empty());
        assert_eq!(ev.score, 1);
        assert_eq!(ev.estimated_location, "Unknown");
        assert!(!ev.is_failure());
    }

    #[test]
    fn test_sanitize_event_team_entries_validated_individually() {
        let ev = event_from(json!({
            "team_details": [
                "Pikachu",
                {"name": "Pidgey", "custom_name": 5},
                null,
                {"health": "full"}
            ]
        }));
        assert_eq!(
            ev.team_details,
            vec![
                TeamMember { name: "Pidgey".into(), custom_name: "".into(), health: "".into() },
                TeamMember { name: "".into(), custom_name: "".into(), health: "full".into() },
            ]
        );
    }

    #[test]
    fn test_sanitize_event_team_details_not_a_list() {
        let ev = event_from(json!({"team_details": {"name": "Pikachu"}}));
        assert!(ev.team_details.is_empty());
    }

    #[test]
    fn test_sanitize_post_full_response() {
        let p = post_from(json!({
            "commentary": "Claude finally beat Brock!",
            "score": 9,
            "post": true,
            "image_id": 2
        }));
        assert_eq!(p.commentary, "Claude finally beat Brock!");
        assert_eq!(p.score, 9);
        assert!(p.post);
        assert_eq!(p.image_id, Some(2));
    }

    #[test]
    fn test_sanitize_post_defaults_and_coercion() {
        let p = post_from(json!({
            "commentary": 12,
            "score": 15,
            "post": "true",
            "image_id": "3"
        }));
        assert_eq!(p.commentary, "");
        assert_eq!(p.score, 10);
        assert!(!p.post);
        assert_eq!(p.image_id, None);

        let p = post_from(json!({"score": -1, "image_id": null}));
        assert_eq!(p.score, 0);
        assert_eq!(p.image_id, None);

        let p = post_from(json!({"image_id": -4}));
        assert_eq!(p.image_id, None);
    }
}
