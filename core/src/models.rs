// core/src/models.rs
//
// Kanonisk skjema for analyseresultater, uavhengig av hvilke feltnavn
// backend faktisk sender. Normalisering til dette skjemaet skjer i
// normalize.rs; her ligger kun typene og deres defaults.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_corner_type() -> String {
    "unknown".to_string()
}

fn default_direction() -> String {
    "center".to_string()
}

fn default_grade_c() -> String {
    "C".to_string()
}

fn default_score() -> f64 {
    50.0
}

fn default_priority() -> i64 {
    5
}

fn default_category() -> String {
    "global".to_string()
}

fn default_difficulty() -> String {
    "moyen".to_string()
}

/// De fire delscorene. Maks per kategori er fast (se scoring.rs) og
/// summerer til 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default)]
    pub apex_precision: f64,
    #[serde(default)]
    pub trajectory_consistency: f64,
    #[serde(default)]
    pub apex_speed: f64,
    #[serde(default)]
    pub sector_times: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    /// 0–100. Kan avvike fra sum(breakdown); display-laget reparerer (scoring.rs).
    #[serde(default)]
    pub overall_score: f64,
    /// "A+" | "A" | "B" | "C" | "D" – eller noe ukjent fra backend.
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
}

/// Per-sving-analyse. Defaults her speiler normaliseringsreglene:
/// score 50, grade "C", corner_type "unknown", retning "center".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerAnalysis {
    #[serde(default)]
    pub corner_id: i64,
    #[serde(default)]
    pub corner_number: i64,
    #[serde(default = "default_corner_type")]
    pub corner_type: String,
    #[serde(default)]
    pub apex_speed_real: f64,
    #[serde(default)]
    pub apex_speed_optimal: f64,
    #[serde(default)]
    pub speed_efficiency: f64,
    #[serde(default)]
    pub apex_distance_error: f64,
    #[serde(default = "default_direction")]
    pub apex_direction_error: String,
    #[serde(default)]
    pub lateral_g_max: f64,
    #[serde(default)]
    pub time_lost: f64,
    #[serde(default = "default_grade_c")]
    pub grade: String,
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entry_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_exit_speed: Option<f64>,
}

impl Default for CornerAnalysis {
    fn default() -> Self {
        Self {
            corner_id: 0,
            corner_number: 0,
            corner_type: default_corner_type(),
            apex_speed_real: 0.0,
            apex_speed_optimal: 0.0,
            speed_efficiency: 0.0,
            apex_distance_error: 0.0,
            apex_direction_error: default_direction(),
            lateral_g_max: 0.0,
            time_lost: 0.0,
            grade: default_grade_c(),
            score: default_score(),
            entry_speed: None,
            exit_speed: None,
            target_entry_speed: None,
            target_exit_speed: None,
        }
    }
}

/// Coaching-råd, antatt pre-sortert på prioritet av backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingAdvice {
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// "braking" | "apex" | "speed" | "trajectory" | "global"
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub impact_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub explanation: String,
    /// "facile" | "moyen" | "difficile"
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

impl Default for CoachingAdvice {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            category: default_category(),
            impact_seconds: 0.0,
            corner: None,
            message: String::new(),
            explanation: String::new(),
            difficulty: default_difficulty(),
        }
    }
}

/// Prosesserings-metadata fra backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub data_points: u64,
    #[serde(default)]
    pub best_corners: Vec<i64>,
    #[serde(default)]
    pub worst_corners: Vec<i64>,
    #[serde(default)]
    pub avg_apex_distance: f64,
    #[serde(default)]
    pub avg_apex_speed_efficiency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps_analyzed: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConditions {
    /// "dry" | "damp" | "wet" | "rain"
    #[serde(default)]
    pub track_condition: String,
    /// °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_temperature: Option<f64>,
}

/// Kanonisk analyseresultat etter normalisering. Dette er formen som
/// lagres lokalt og rendres; `success`-flagget fra wire-svaret er
/// verifisert og strippet før vi kommer hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub analysis_id: String,
    /// ISO-8601 fra backend.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub corners_detected: u32,
    /// Sekunder; 0.0 betyr ukjent.
    #[serde(default)]
    pub lap_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_lap_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_lap_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap_times: Option<Vec<f64>>,
    #[serde(default)]
    pub performance_score: PerformanceScore,
    #[serde(default)]
    pub corner_analysis: Vec<CornerAnalysis>,
    #[serde(default)]
    pub coaching_advice: Vec<CoachingAdvice>,
    /// plotnavn → URL (trajectory_2d, speed_heatmap, ...).
    #[serde(default)]
    pub plots: BTreeMap<String, String>,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_conditions: Option<SessionConditions>,
}

/// Én oppdaget runde fra parse-laps (for valg før analyse).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapInfo {
    #[serde(default)]
    pub lap_number: u32,
    #[serde(default)]
    pub lap_time_seconds: f64,
    #[serde(default)]
    pub points_count: u64,
    #[serde(default)]
    pub is_outlier: bool,
}

/// Status for en innsendt analyse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    #[serde(default)]
    pub analysis_id: String,
    /// "completed" | "processing" | "failed"
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Persistens-wrapper: det som faktisk skrives til lagringsmediet.
/// `timestamp` er skrivetidspunkt (epoch millis), ikke backend-tid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: String,
    pub timestamp: i64,
    pub result: AnalysisResult,
}

/// Lettvekts-projeksjon for listing, sortert nyest først.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: String,
    /// ISO-8601 avledet av `timestamp`.
    pub date: String,
    /// Skrivetidspunkt, epoch millis.
    pub timestamp: i64,
    /// Avrundet rå overall_score (ikke display-reparert).
    pub score: i64,
    pub corner_count: u32,
    pub lap_time: f64,
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}
