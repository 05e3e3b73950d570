// core/src/validation.rs
//
// Pre-upload-sjekk av telemetri-CSV. Ren funksjon uten sideeffekter;
// transportlaget kortslutter med en validation-feil før noe nettverks-I/O.

/// Maks filstørrelse for upload.
pub const MAX_FILE_SIZE_MB: u64 = 50;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

/// Under dette er filen neppe en reell telemetri-eksport.
pub const MIN_FILE_SIZE_BYTES: u64 = 1000;

/// Utfall av validering. `error` er satt hvis og bare hvis `valid` er false.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn rejected(msg: String) -> Self {
        Self { valid: false, error: Some(msg) }
    }
}

/// Validerer en kandidatfil før innsending. Reglene sjekkes i rekkefølge:
/// 1) filnavn må ende på `.csv` (case-insensitivt)
/// 2) størrelse ≤ 50 MiB (grensen inklusiv)
/// 3) størrelse ≥ 1000 bytes (grensen inklusiv)
pub fn validate_csv_file(filename: &str, size_bytes: u64) -> ValidationOutcome {
    if !filename.to_lowercase().ends_with(".csv") {
        return ValidationOutcome::rejected("file must be a CSV (.csv)".to_string());
    }

    if size_bytes > MAX_FILE_SIZE_BYTES {
        let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
        return ValidationOutcome::rejected(format!(
            "file too large ({size_mb:.2} MB), maximum is {MAX_FILE_SIZE_MB} MB"
        ));
    }

    if size_bytes < MIN_FILE_SIZE_BYTES {
        return ValidationOutcome::rejected(
            "file too small (under 1 KB), check that it is a valid CSV export".to_string(),
        );
    }

    ValidationOutcome::ok()
}
