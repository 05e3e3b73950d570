// core/tests/test_normalize.rs
use apexcoach_core::{normalize_advice, normalize_corner, normalize_result};
use serde_json::json;

#[test]
fn corner_fallback_keys_are_accepted() {
    // legacy-form: 'type' og 'apex_distance_m' uten kanoniske nøkler
    let c = normalize_corner(&json!({"type": "left", "apex_distance_m": 0.3}));
    assert_eq!(c.corner_type, "left");
    assert_eq!(c.apex_distance_error, 0.3);
}

#[test]
fn canonical_keys_win_over_alternates() {
    let c = normalize_corner(&json!({
        "corner_type": "right",
        "type": "left",
        "apex_distance_error": 1.5,
        "apex_distance_m": 0.3
    }));
    assert_eq!(c.corner_type, "right");
    assert_eq!(c.apex_distance_error, 1.5);
}

#[test]
fn corner_number_falls_back_to_corner_id() {
    let c = normalize_corner(&json!({"corner_id": 7}));
    assert_eq!(c.corner_id, 7);
    assert_eq!(c.corner_number, 7);

    let c = normalize_corner(&json!({"corner_id": 7, "corner_number": 3}));
    assert_eq!(c.corner_number, 3);
}

#[test]
fn corner_normalization_is_idempotent() {
    let raw = json!({
        "corner_id": 4,
        "type": "right",
        "apex_speed_real": 71.2,
        "apex_speed_optimal": 75.0,
        "speed_efficiency": 0.95,
        "apex_distance_m": 0.42,
        "lateral_g_max": 1.8,
        "time_lost": 0.31,
        "grade": "B",
        "score": 81,
        "entry_speed": 110.5
    });

    let once = normalize_corner(&raw);
    // kanonisk output matet inn igjen som rå input skal være et no-op
    let again = normalize_corner(&serde_json::to_value(&once).expect("serialize corner"));
    assert_eq!(once, again);
}

#[test]
fn advice_fallback_and_idempotence() {
    let a = normalize_advice(&json!({"time_impact_seconds": 1.2, "message": "Brake later"}));
    assert_eq!(a.impact_seconds, 1.2);
    assert_eq!(a.message, "Brake later");
    assert_eq!(a.priority, 5);
    assert_eq!(a.difficulty, "moyen");

    let again = normalize_advice(&serde_json::to_value(&a).expect("serialize advice"));
    assert_eq!(a, again);
}

#[test]
fn full_result_is_lifted_to_canonical_schema() {
    let body = json!({
        "success": true,
        "analysis_id": "abc123",
        "timestamp": "2025-06-01T10:30:00Z",
        "corners_detected": 12,
        "lap_time": 93.2,
        "best_lap_time": 92.8,
        "performance_score": {
            "overall_score": 78.0,
            "grade": "B",
            "breakdown": {
                "apex_precision": 25.0,
                "trajectory_consistency": 18.0,
                "apex_speed": 20.0,
                "sector_times": 15.0
            }
        },
        "corner_analysis": [
            {"type": "left", "apex_speed_real": 70.0}
        ],
        "coaching_advice": [
            {"time_impact_seconds": 1.2, "message": "Brake later"}
        ],
        "plots": {"trajectory_2d": "https://cdn.example/abc123/traj.png"},
        "statistics": {
            "processing_time_seconds": 2.8,
            "data_points": 14200,
            "best_corners": [3, 7],
            "worst_corners": [9],
            "avg_apex_distance": 0.6,
            "avg_apex_speed_efficiency": 0.91
        },
        "session_conditions": {"track_condition": "dry", "track_temperature": 28.5}
    });

    let result = normalize_result(body).expect("normalize");
    assert_eq!(result.analysis_id, "abc123");
    assert_eq!(result.corners_detected, 12);
    assert_eq!(result.performance_score.grade, "B");
    assert_eq!(result.performance_score.breakdown.apex_precision, 25.0);

    // legacy-nøkler reparert i begge arrays
    assert_eq!(result.corner_analysis.len(), 1);
    assert_eq!(result.corner_analysis[0].corner_type, "left");
    assert_eq!(result.corner_analysis[0].apex_speed_real, 70.0);
    assert_eq!(result.corner_analysis[0].score, 50.0);
    assert_eq!(result.coaching_advice[0].impact_seconds, 1.2);

    assert_eq!(
        result.plots.get("trajectory_2d").map(String::as_str),
        Some("https://cdn.example/abc123/traj.png")
    );
    assert_eq!(result.statistics.data_points, 14200);
    let conditions = result.session_conditions.expect("conditions");
    assert_eq!(conditions.track_condition, "dry");
    assert_eq!(conditions.track_temperature, Some(28.5));
}

#[test]
fn missing_arrays_become_empty_lists() {
    let result = normalize_result(json!({
        "success": true,
        "analysis_id": "x1",
        "corners_detected": 0
    }))
    .expect("normalize");
    assert!(result.corner_analysis.is_empty());
    assert!(result.coaching_advice.is_empty());
    assert!(result.plots.is_empty());
}
