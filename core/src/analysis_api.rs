// core/src/analysis_api.rs
//
// Blocking HTTP-klient mot analyse-backend (multipart upload, lap-preview,
// status og health). Hver operasjon har sin egen timeout og bygger sin egen
// request; to samtidige kall deler ingen mutabel tilstand. Feil klassifiseres
// inn i den lukkede taksonomien i error.rs. Ingen retry – det er callers
// ansvar.
use std::env;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::IntoDeserializer;
use serde::Deserialize;
use serde_json::Value;
use serde_path_to_error as spte;

use crate::error::ApiError;
use crate::models::{AnalysisResult, AnalysisStatus, BackendHealth, LapInfo};
use crate::normalize::normalize_result;
use crate::validation::validate_csv_file;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Miljøvariabel som overstyrer base-URL (prod setter denne).
pub const API_URL_ENV: &str = "APEXCOACH_API_URL";

/// Banekondisjon sendt med analysen. Ukjente labels faller tilbake til Dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCondition {
    Dry,
    Damp,
    Wet,
    Rain,
}

impl TrackCondition {
    pub fn label(self) -> &'static str {
        match self {
            TrackCondition::Dry => "dry",
            TrackCondition::Damp => "damp",
            TrackCondition::Wet => "wet",
            TrackCondition::Rain => "rain",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "dry" => TrackCondition::Dry,
            "damp" => TrackCondition::Damp,
            "wet" => TrackCondition::Wet,
            "rain" => TrackCondition::Rain,
            other => {
                log::debug!("unknown track condition '{other}', falling back to dry");
                TrackCondition::Dry
            }
        }
    }
}

/// Konfigurasjon for klienten. Timeoutene speiler kall-typene:
/// analyse er tyngst, health skal svare kjapt.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub analyze_timeout: Duration,
    pub preview_timeout: Duration,
    pub status_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            analyze_timeout: Duration::from_secs(30),
            preview_timeout: Duration::from_secs(20),
            status_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl ApiConfig {
    /// Leser base-URL fra `APEXCOACH_API_URL`, ellers default (lokal dev).
    pub fn from_env() -> Self {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            ..Self::default()
        }
    }
}

/// Fil klar for upload: navn + innhold. Valideres før noe nettverks-I/O.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path).map_err(|e| {
            ApiError::Validation(format!("could not read file {}: {e}", path.display()))
        })?;
        Ok(Self { filename, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Valgfrie analyse-parametre.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Rundenumre som skal inkluderes; sendes bare hvis ikke-tom.
    pub lap_filter: Vec<u32>,
    /// Banekondisjon-label; utenfor settet → "dry".
    pub track_condition: Option<String>,
    /// °C; sendes bare hvis endelig (finite).
    pub track_temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AnalysisApiClient {
    http: Client,
    config: ApiConfig,
}

impl AnalysisApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Laster opp og analyserer en telemetri-CSV. Kjeden er:
    /// validering → multipart POST → feilklassifisering → normalisering.
    pub fn analyze(
        &self,
        file: &UploadFile,
        opts: &AnalyzeOptions,
    ) -> Result<AnalysisResult, ApiError> {
        self.check_file(file)?;

        let mut form = Form::new().part(
            "file",
            Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str("text/csv")
                .map_err(|e| ApiError::Unknown(format!("could not build upload part: {e}")))?,
        );

        if !opts.lap_filter.is_empty() {
            let encoded = serde_json::to_string(&opts.lap_filter)
                .map_err(|e| ApiError::Serialization(format!("could not encode lap filter: {e}")))?;
            form = form.text("lap_filter", encoded);
        }

        let condition = TrackCondition::from_label(opts.track_condition.as_deref().unwrap_or("dry"));
        form = form.text("track_condition", condition.label());

        if let Some(temp) = opts.track_temperature {
            if temp.is_finite() {
                form = form.text("track_temperature", temp.to_string());
            }
        }

        let response = self
            .http
            .post(format!("{}/api/v1/analyze", self.config.base_url))
            .multipart(form)
            .timeout(self.config.analyze_timeout)
            .send()
            .map_err(|e| self.classify(e, "CSV upload and analysis", self.config.analyze_timeout))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| self.classify(e, "CSV upload and analysis", self.config.analyze_timeout))?;

        decode_analyze_body(status, &body)
    }

    /// Parser CSV-en server-side og returnerer oppdagede runder, for valg
    /// før full analyse.
    pub fn preview_laps(&self, file: &UploadFile) -> Result<Vec<LapInfo>, ApiError> {
        self.check_file(file)?;

        let form = Form::new().part(
            "file",
            Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str("text/csv")
                .map_err(|e| ApiError::Unknown(format!("could not build upload part: {e}")))?,
        );

        let response = self
            .http
            .post(format!("{}/api/v1/parse-laps", self.config.base_url))
            .multipart(form)
            .timeout(self.config.preview_timeout)
            .send()
            .map_err(|e| self.classify(e, "lap preview", self.config.preview_timeout))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| self.classify(e, "lap preview", self.config.preview_timeout))?;

        decode_laps_body(status, &body)
    }

    /// Status for en tidligere innsendt analyse.
    pub fn status(&self, analysis_id: &str) -> Result<AnalysisStatus, ApiError> {
        if analysis_id.trim().is_empty() {
            return Err(ApiError::Validation("invalid analysis id".to_string()));
        }

        let response = self
            .http
            .get(format!(
                "{}/api/v1/status/{}",
                self.config.base_url,
                analysis_id.trim()
            ))
            .timeout(self.config.status_timeout)
            .send()
            .map_err(|e| self.classify(e, "status lookup", self.config.status_timeout))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| self.classify(e, "status lookup", self.config.status_timeout))?;

        decode_status_body(status, &body)
    }

    /// Health-sjekk mot backend.
    pub fn health(&self) -> Result<BackendHealth, ApiError> {
        let response = self
            .http
            .get(format!("{}/health", self.config.base_url))
            .timeout(self.config.health_timeout)
            .send()
            .map_err(|e| self.classify(e, "health check", self.config.health_timeout))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| self.classify(e, "health check", self.config.health_timeout))?;

        decode_health_body(status, &body)
    }

    /// true hvis health-kallet lykkes. Nyttig for tidlig feilmelding i UI
    /// før en tung upload settes i gang.
    pub fn is_reachable(&self) -> bool {
        self.health().is_ok()
    }

    fn check_file(&self, file: &UploadFile) -> Result<(), ApiError> {
        let outcome = validate_csv_file(&file.filename, file.size());
        if !outcome.valid {
            return Err(ApiError::Validation(
                outcome.error.unwrap_or_else(|| "validation failed".to_string()),
            ));
        }
        Ok(())
    }

    fn classify(&self, e: reqwest::Error, context: &str, timeout: Duration) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(format!(
                "request timed out after {}s during {context}; the backend may be busy or the file too large",
                timeout.as_secs()
            ))
        } else if e.is_connect() {
            ApiError::Network(format!(
                "could not connect to the backend at {}; check that it is reachable",
                self.config.base_url
            ))
        } else {
            ApiError::Unknown(format!("error during {context}: {e}"))
        }
    }
}

/// Feil-body slik backend rapporterer dem: {success:false, error, message}.
#[derive(Debug, Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Ikke-2xx → taksonomifeil. Feil-bodyen parses opportunistisk og dens
/// error/message propageres når de finnes; ellers en generisk melding med
/// HTTP-statusen.
fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    if let Ok(wire) = serde_json::from_str::<WireErrorBody>(body) {
        if wire.error.is_some() || wire.message.is_some() {
            let message = wire
                .message
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
            return ApiError::from_kind_label(
                wire.error.as_deref().unwrap_or("http_error"),
                message,
            );
        }
    }
    ApiError::Http(format!("server error ({})", status.as_u16()))
}

fn parse_json(body: &str) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Err(ApiError::InvalidResponse(
            "empty response from server".to_string(),
        ));
    }
    serde_json::from_str(body).map_err(|_| {
        let preview: String = body.chars().take(100).collect();
        ApiError::InvalidResponse(format!("invalid JSON response: {preview}"))
    })
}

fn success_flag(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn decode_analyze_body(status: StatusCode, body: &str) -> Result<AnalysisResult, ApiError> {
    if !status.is_success() {
        return Err(error_from_status(status, body));
    }

    let value = parse_json(body)?;
    // 2xx kan fortsatt bety feilet analyse – payloaden har fasit.
    if !success_flag(&value) {
        return Err(ApiError::AnalysisFailed(
            "the analysis failed; check that the CSV file is valid".to_string(),
        ));
    }

    normalize_result(value)
}

fn decode_laps_body(status: StatusCode, body: &str) -> Result<Vec<LapInfo>, ApiError> {
    if !status.is_success() {
        return Err(error_from_status(status, body));
    }

    let value = parse_json(body)?;
    let laps = value.get("laps").and_then(Value::as_array);
    if !success_flag(&value) || laps.is_none() {
        return Err(ApiError::InvalidResponse(
            "invalid parse-laps response".to_string(),
        ));
    }

    let laps = Value::Array(laps.cloned().unwrap_or_default());
    let mut track = spte::Track::new();
    let de = spte::Deserializer::new(laps.into_deserializer(), &mut track);
    Vec::<LapInfo>::deserialize(de).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "parse-laps response shape mismatch at {}: {}",
            track.path(),
            e
        ))
    })
}

fn decode_status_body(status: StatusCode, body: &str) -> Result<AnalysisStatus, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Http(format!(
            "failed to fetch analysis status ({})",
            status.as_u16()
        )));
    }

    let value = parse_json(body)?;
    let mut track = spte::Track::new();
    let de = spte::Deserializer::new(value.into_deserializer(), &mut track);
    AnalysisStatus::deserialize(de).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "status response shape mismatch at {}: {}",
            track.path(),
            e
        ))
    })
}

fn decode_health_body(status: StatusCode, body: &str) -> Result<BackendHealth, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Http(format!(
            "backend unavailable ({})",
            status.as_u16()
        )));
    }

    let value = parse_json(body)?;
    let mut track = spte::Track::new();
    let de = spte::Deserializer::new(value.into_deserializer(), &mut track);
    BackendHealth::deserialize(de).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "health response shape mismatch at {}: {}",
            track.path(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn track_condition_falls_back_to_dry() {
        assert_eq!(TrackCondition::from_label("wet"), TrackCondition::Wet);
        assert_eq!(TrackCondition::from_label("snow"), TrackCondition::Dry);
        assert_eq!(TrackCondition::from_label(""), TrackCondition::Dry);
    }

    #[test]
    fn error_body_kind_and_message_are_propagated() {
        let body = json!({"success": false, "error": "validation", "message": "bad file"});
        let err = error_from_status(StatusCode::BAD_REQUEST, &body.to_string());
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.message(), "bad file");
    }

    #[test]
    fn unparseable_error_body_degrades_to_status_message() {
        let err = error_from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.kind(), "http_error");
        assert!(err.message().contains("500"));
    }

    #[test]
    fn empty_2xx_body_is_invalid_response() {
        let err = decode_analyze_body(StatusCode::OK, "").unwrap_err();
        assert_eq!(err.kind(), "invalid_response");
    }

    #[test]
    fn declared_failure_beats_http_success() {
        let body = json!({"success": false, "analysis_id": "x"});
        let err = decode_analyze_body(StatusCode::OK, &body.to_string()).unwrap_err();
        assert_eq!(err.kind(), "analysis_failed");
    }

    #[test]
    fn laps_must_be_a_list() {
        let body = json!({"success": true, "laps": "nope"});
        let err = decode_laps_body(StatusCode::OK, &body.to_string()).unwrap_err();
        assert_eq!(err.kind(), "invalid_response");

        let body = json!({"success": true, "laps": [
            {"lap_number": 1, "lap_time_seconds": 92.4, "points_count": 1200, "is_outlier": false}
        ]});
        let laps = decode_laps_body(StatusCode::OK, &body.to_string()).unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].lap_number, 1);
        assert!(!laps[0].is_outlier);
    }
}
