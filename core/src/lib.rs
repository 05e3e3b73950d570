// core/src/lib.rs
//
// ApexCoach kjerne: klient-side logikk for telemetri-analyse.
//
//   validation    – pre-upload-sjekk av CSV-filer
//   analysis_api  – blocking HTTP-klient mot analyse-backend
//   normalize     – tolerant mapping av backend-svar til kanonisk skjema
//   storage       – lokal lagring per identitet med retention-tak
//   scoring       – rene display/aggregat-avledninger
//
// Typisk flyt: validate → analyze → normalize (skjer i klienten) →
// save → list_summaries → display_score/aggregate_statistics.
// Lagring etter analyse er et separat, ikke-blokkerende steg: en feilet
// save skal rapporteres som sekundær advarsel, aldri velte selve analysen.

pub mod analysis_api;
pub mod error;
pub mod models;
pub mod normalize;
pub mod scoring;
pub mod storage;
pub mod validation;

pub use analysis_api::{
    AnalysisApiClient, AnalyzeOptions, ApiConfig, TrackCondition, UploadFile, API_URL_ENV,
};
pub use error::ApiError;
pub use models::{
    AnalysisResult, AnalysisStatus, AnalysisSummary, BackendHealth, CoachingAdvice,
    CornerAnalysis, LapInfo, PerformanceScore, ScoreBreakdown, SessionConditions, Statistics,
    StoredAnalysis,
};
pub use normalize::{normalize_advice, normalize_corner, normalize_result};
pub use scoring::{
    aggregate_statistics, breakdown_sum, display_score, score_tier, AggregateStats,
    BREAKDOWN_MAX_APEX_PRECISION, BREAKDOWN_MAX_APEX_SPEED, BREAKDOWN_MAX_SECTOR_TIMES,
    BREAKDOWN_MAX_TRAJECTORY_CONSISTENCY,
};
pub use storage::{
    AnalysisStore, DirKvStore, KvStore, MemKvStore, GUEST_IDENTITY, MAX_STORED_ANALYSES,
};
pub use validation::{
    validate_csv_file, ValidationOutcome, MAX_FILE_SIZE_BYTES, MAX_FILE_SIZE_MB,
    MIN_FILE_SIZE_BYTES,
};
