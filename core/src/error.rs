// core/src/error.rs
use thiserror::Error;

/// Felles feiltype for hele kjernen. Lukket taksonomi: hver variant har en
/// maskinlesbar `kind` (stabil streng) og en menneskelesbar melding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Filen passerte ikke pre-upload-validering (extension/størrelse).
    #[error("{0}")]
    Validation(String),

    /// Forespørselen ble avbrutt av timeout.
    #[error("{0}")]
    Timeout(String),

    /// Kunne ikke nå backend (connect-feil, DNS, avbrutt socket).
    #[error("{0}")]
    Network(String),

    /// Backend svarte med ikke-2xx status.
    #[error("{0}")]
    Http(String),

    /// 2xx-svar, men payload melder selv at analysen feilet.
    #[error("{0}")]
    AnalysisFailed(String),

    /// 2xx-svar med strukturelt ugyldig payload (tom, ikke-JSON, feil form).
    #[error("{0}")]
    InvalidResponse(String),

    /// Lagringsmediet er utilgjengelig eller ikke skrivbart.
    #[error("{0}")]
    StorageUnavailable(String),

    /// Resultatet lot seg ikke enkode/dekode som JSON.
    #[error("{0}")]
    Serialization(String),

    /// Oppslag på en id som ikke finnes (kun der operasjonen krever treff).
    #[error("{0}")]
    NotFound(String),

    /// Alt annet.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    /// Stabil, maskinlesbar feilkategori.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Timeout(_) => "timeout",
            ApiError::Network(_) => "network",
            ApiError::Http(_) => "http_error",
            ApiError::AnalysisFailed(_) => "analysis_failed",
            ApiError::InvalidResponse(_) => "invalid_response",
            ApiError::StorageUnavailable(_) => "storage_unavailable",
            ApiError::Serialization(_) => "serialization_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unknown(_) => "unknown",
        }
    }

    /// Menneskelesbar melding (samme som Display).
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(m)
            | ApiError::Timeout(m)
            | ApiError::Network(m)
            | ApiError::Http(m)
            | ApiError::AnalysisFailed(m)
            | ApiError::InvalidResponse(m)
            | ApiError::StorageUnavailable(m)
            | ApiError::Serialization(m)
            | ApiError::NotFound(m)
            | ApiError::Unknown(m) => m,
        }
    }

    /// Bygg en variant fra en `error`-label slik backend rapporterer den i
    /// feil-bodies (`{success:false, error, message}`). Ukjente labels mappes
    /// til `http_error` siden de kun oppstår i HTTP-feilstier.
    pub fn from_kind_label(label: &str, message: String) -> ApiError {
        match label {
            "validation" => ApiError::Validation(message),
            "timeout" => ApiError::Timeout(message),
            "network" => ApiError::Network(message),
            "http_error" => ApiError::Http(message),
            "analysis_failed" => ApiError::AnalysisFailed(message),
            "invalid_response" => ApiError::InvalidResponse(message),
            "storage_unavailable" => ApiError::StorageUnavailable(message),
            "serialization_error" => ApiError::Serialization(message),
            "not_found" => ApiError::NotFound(message),
            "unknown" => ApiError::Unknown(message),
            _ => ApiError::Http(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(ApiError::Validation("x".into()).kind(), "validation");
        assert_eq!(ApiError::Http("x".into()).kind(), "http_error");
        assert_eq!(ApiError::Serialization("x".into()).kind(), "serialization_error");
        assert_eq!(ApiError::Unknown("x".into()).kind(), "unknown");
    }

    #[test]
    fn from_kind_label_maps_known_and_unknown() {
        let e = ApiError::from_kind_label("timeout", "t".into());
        assert_eq!(e.kind(), "timeout");
        // ukjent label fra server → http_error
        let e = ApiError::from_kind_label("weird_server_kind", "m".into());
        assert_eq!(e.kind(), "http_error");
        assert_eq!(e.message(), "m");
    }
}
