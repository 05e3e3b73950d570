// core/src/normalize.rs
//
// Tolerant normalisering av backend-svar til kanonisk skjema.
// Backend har levert flere feltnavn-varianter over tid (type vs corner_type,
// apex_distance_m vs apex_distance_error, time_impact_seconds vs
// impact_seconds); her aksepteres alle, med diagnostikk via `log` når en
// fallback-nøkkel brukes eller et forventet felt mangler. Per-element-
// normalisering feiler aldri – den reparerer og rapporterer.
use serde::de::IntoDeserializer;
use serde::Deserialize;
use serde_json::Value;
use serde_path_to_error as spte;

use crate::error::ApiError;
use crate::models::{AnalysisResult, CoachingAdvice, CornerAnalysis};

/// Permissiv tall-koersjon: JSON-tall rett gjennom, numeriske strenger
/// parses, alt annet → None (caller velger default).
fn num(raw: &Value, key: &str) -> Option<f64> {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn int(raw: &Value, key: &str) -> Option<i64> {
    num(raw, key).map(|x| x as i64)
}

fn text(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Normaliserer et rått sving-objekt fra API-et til `CornerAnalysis`.
/// Håndterer alternative nøkler og logger når en forventet nøkkel mangler.
pub fn normalize_corner(raw: &Value) -> CornerAnalysis {
    if raw.get("type").is_some() && raw.get("corner_type").is_none() {
        log::warn!("corner: expected 'corner_type', got 'type'");
    }
    if raw.get("apex_distance_m").is_some() && raw.get("apex_distance_error").is_none() {
        log::warn!("corner: expected 'apex_distance_error', got 'apex_distance_m'");
    }
    for key in ["corner_id", "corner_number", "grade", "score"] {
        if raw.get(key).is_none() {
            log::warn!("corner: missing expected key '{key}'");
        }
    }

    let corner_id = int(raw, "corner_id").unwrap_or(0);

    CornerAnalysis {
        corner_id,
        // corner_number faller tilbake til corner_id
        corner_number: int(raw, "corner_number").unwrap_or(corner_id),
        corner_type: text(raw, "corner_type")
            .or_else(|| text(raw, "type"))
            .unwrap_or_else(|| "unknown".to_string()),
        apex_speed_real: num(raw, "apex_speed_real").unwrap_or(0.0),
        apex_speed_optimal: num(raw, "apex_speed_optimal").unwrap_or(0.0),
        speed_efficiency: num(raw, "speed_efficiency").unwrap_or(0.0),
        apex_distance_error: num(raw, "apex_distance_error")
            .or_else(|| num(raw, "apex_distance_m"))
            .unwrap_or(0.0),
        apex_direction_error: text(raw, "apex_direction_error")
            .unwrap_or_else(|| "center".to_string()),
        lateral_g_max: num(raw, "lateral_g_max").unwrap_or(0.0),
        time_lost: num(raw, "time_lost").unwrap_or(0.0),
        grade: text(raw, "grade").unwrap_or_else(|| "C".to_string()),
        score: num(raw, "score").unwrap_or(50.0),
        entry_speed: num(raw, "entry_speed"),
        exit_speed: num(raw, "exit_speed"),
        target_entry_speed: num(raw, "target_entry_speed"),
        target_exit_speed: num(raw, "target_exit_speed"),
    }
}

/// Normaliserer et rått coaching-råd (impact_seconds vs time_impact_seconds).
pub fn normalize_advice(raw: &Value) -> CoachingAdvice {
    if raw.get("time_impact_seconds").is_some() && raw.get("impact_seconds").is_none() {
        log::warn!("coaching: expected 'impact_seconds', got 'time_impact_seconds'");
    }

    CoachingAdvice {
        priority: int(raw, "priority").unwrap_or(5),
        category: text(raw, "category").unwrap_or_else(|| "global".to_string()),
        impact_seconds: num(raw, "impact_seconds")
            .or_else(|| num(raw, "time_impact_seconds"))
            .unwrap_or(0.0),
        corner: int(raw, "corner"),
        message: text(raw, "message").unwrap_or_default(),
        explanation: text(raw, "explanation").unwrap_or_default(),
        difficulty: text(raw, "difficulty").unwrap_or_else(|| "moyen".to_string()),
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Løfter et komplett 2xx-body til kanonisk `AnalysisResult`.
/// corner_analysis/coaching_advice går gjennom per-element-normalisering;
/// resten av konvolutten dekodes typed med path-sporing, slik at en
/// invalid_response-melding peker på feltet som feilet.
pub fn normalize_result(body: Value) -> Result<AnalysisResult, ApiError> {
    let mut obj = match body {
        Value::Object(m) => m,
        other => {
            return Err(ApiError::InvalidResponse(format!(
                "expected JSON object in analysis response, got {}",
                json_type_name(&other)
            )))
        }
    };

    let corners: Vec<CornerAnalysis> = obj
        .remove("corner_analysis")
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_corner).collect())
        .unwrap_or_default();

    let advice: Vec<CoachingAdvice> = obj
        .remove("coaching_advice")
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_advice).collect())
        .unwrap_or_default();

    let envelope = Value::Object(obj);
    let mut track = spte::Track::new();
    let de = spte::Deserializer::new(envelope.into_deserializer(), &mut track);
    let mut result: AnalysisResult = AnalysisResult::deserialize(de).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "analysis response shape mismatch at {}: {}",
            track.path(),
            e
        ))
    })?;

    result.corner_analysis = corners;
    result.coaching_advice = advice;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn corner_defaults_from_empty_object() {
        let c = normalize_corner(&json!({}));
        assert_eq!(c.corner_type, "unknown");
        assert_eq!(c.apex_direction_error, "center");
        assert_eq!(c.grade, "C");
        assert_eq!(c.score, 50.0);
        assert_eq!(c.time_lost, 0.0);
        assert!(c.entry_speed.is_none());
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let c = normalize_corner(&json!({"apex_speed_real": "72.5", "score": "90"}));
        assert_eq!(c.apex_speed_real, 72.5);
        assert_eq!(c.score, 90.0);
        // ikke-numerisk input → default, ikke feil
        let c = normalize_corner(&json!({"apex_speed_real": "abc", "score": [1]}));
        assert_eq!(c.apex_speed_real, 0.0);
        assert_eq!(c.score, 50.0);
    }

    #[test]
    fn advice_defaults_from_empty_object() {
        let a = normalize_advice(&json!({}));
        assert_eq!(a.priority, 5);
        assert_eq!(a.category, "global");
        assert_eq!(a.impact_seconds, 0.0);
        assert_eq!(a.difficulty, "moyen");
        assert!(a.corner.is_none());
    }

    #[test]
    fn result_envelope_must_be_object() {
        let err = normalize_result(json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.kind(), "invalid_response");
    }
}
