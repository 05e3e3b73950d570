// core/src/storage.rs
//
// Lokal persistens av analyseresultater, isolert per identitet (innlogget
// bruker-id eller "guest"). Mediumet er en injisert nøkkel/verdi-port slik
// at butikken kan testes mot et in-memory-fake; all nøkkel-prefiksing og
// retention-logikk ligger her, uavhengig av mediumet.
//
// Nøkkelskjema:
//   index:  {prefix}_{identity}          → JSON-array av id-er
//   entry:  {prefix}_{identity}_{id}     → JSON-enkodet StoredAnalysis
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, TimeZone, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::ApiError;
use crate::models::{AnalysisResult, AnalysisSummary, StoredAnalysis};

/// Reservert identitet når ingen bruker er pålogget.
pub const GUEST_IDENTITY: &str = "guest";

/// Maks antall analyser som beholdes per identitet.
pub const MAX_STORED_ANALYSES: usize = 20;

const DEFAULT_PREFIX: &str = "apex_analysis";

/// Nøkkel/verdi-port mot det underliggende lagringsmediet.
pub trait KvStore {
    /// Er mediumet skrivbart akkurat nå?
    fn available(&self) -> bool;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&self, key: &str);
    fn list_keys(&self) -> Vec<String>;
}

/// In-memory-medium. Delbar (klonet håndtak ser samme innhold), slik at
/// tester kan inspisere og manipulere rålagringen ved siden av butikken.
#[derive(Debug, Clone, Default)]
pub struct MemKvStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemKvStore {
    fn available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.inner
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.inner.lock().unwrap().remove(key);
    }

    fn list_keys(&self) -> Vec<String> {
        self.inner.lock().unwrap().keys().cloned().collect()
    }
}

/// Filbasert medium: én fil per nøkkel under en rotkatalog. Nøkler
/// prosent-enkodes injektivt til filnavn, så to ulike nøkler kan aldri
/// kollidere på disk (viktig for identitets-isolasjonen).
#[derive(Debug, Clone)]
pub struct DirKvStore {
    root: PathBuf,
}

impl DirKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn decode_key(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (
                (bytes[i + 1] as char).to_digit(16),
                (bytes[i + 2] as char).to_digit(16),
            ) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

impl KvStore for DirKvStore {
    fn available(&self) -> bool {
        // Test-skriv og slett, samme sjekk som en localStorage-probe.
        if fs::create_dir_all(&self.root).is_err() {
            return false;
        }
        let probe = self.root.join(".probe");
        if fs::write(&probe, b"probe").is_err() {
            return false;
        }
        let _ = fs::remove_file(&probe);
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            ApiError::StorageUnavailable(format!("storage directory is not writable: {e}"))
        })?;
        fs::write(self.file_for(key), value).map_err(|e| {
            ApiError::StorageUnavailable(format!("storage medium is not writable: {e}"))
        })
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.file_for(key));
    }

    fn list_keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name != ".probe")
            .map(|name| decode_key(&name))
            .collect()
    }
}

/// Genererer en id for resultater uten analysis_id fra backend:
/// epoch-millis pluss 7 tilfeldige alfanumeriske tegn. Kollisjon sjekkes
/// ikke mot indeksen; sannsynligheten er neglisjerbar ved 20 beholdte
/// innslag.
fn generate_analysis_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("{millis}_{suffix}")
}

fn millis_to_iso(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Butikken. Alle operasjoner tar en valgfri identitet; blank/None → guest.
/// Ingen operasjon under én identitet kan lese eller påvirke en annens data.
pub struct AnalysisStore<S: KvStore> {
    kv: S,
    prefix: String,
    max_stored: usize,
}

impl<S: KvStore> AnalysisStore<S> {
    pub fn new(kv: S) -> Self {
        Self::with_config(kv, DEFAULT_PREFIX, MAX_STORED_ANALYSES)
    }

    pub fn with_config(kv: S, prefix: impl Into<String>, max_stored: usize) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
            max_stored,
        }
    }

    fn suffix(identity: Option<&str>) -> String {
        match identity.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => GUEST_IDENTITY.to_string(),
        }
    }

    fn index_key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.prefix)
    }

    fn entry_key(&self, suffix: &str, id: &str) -> String {
        format!("{}_{suffix}_{id}", self.prefix)
    }

    fn read_index(&self, suffix: &str) -> Vec<String> {
        let Some(raw) = self.kv.get(&self.index_key(suffix)) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("unreadable analyses index for '{suffix}', resetting: {e}");
                Vec::new()
            }
        }
    }

    fn write_index(&self, suffix: &str, ids: &[String]) -> Result<(), ApiError> {
        let raw = serde_json::to_string(ids)
            .map_err(|e| ApiError::Serialization(format!("could not encode index: {e}")))?;
        self.kv.set(&self.index_key(suffix), &raw)
    }

    /// Lagrer et resultat og returnerer id-en det ble lagret under
    /// (resultatets analysis_id, eller en generert id om den mangler).
    /// Retention håndheves etterpå; indeks-skriv er alltid siste steg.
    pub fn save(
        &self,
        result: &AnalysisResult,
        identity: Option<&str>,
    ) -> Result<String, ApiError> {
        if !self.kv.available() {
            return Err(ApiError::StorageUnavailable(
                "local storage is not available".to_string(),
            ));
        }

        let suffix = Self::suffix(identity);
        let id = if result.analysis_id.trim().is_empty() {
            generate_analysis_id()
        } else {
            result.analysis_id.clone()
        };

        let mut owned = result.clone();
        owned.analysis_id = id.clone();
        let stored = StoredAnalysis {
            id: id.clone(),
            timestamp: Utc::now().timestamp_millis(),
            result: owned,
        };

        let payload = serde_json::to_string(&stored)
            .map_err(|e| ApiError::Serialization(format!("could not encode analysis {id}: {e}")))?;
        self.kv.set(&self.entry_key(&suffix, &id), &payload)?;

        let mut index = self.read_index(&suffix);
        if !index.iter().any(|existing| existing == &id) {
            index.push(id.clone());
            self.write_index(&suffix, &index)?;
        }

        self.enforce_retention(&suffix);

        Ok(id)
    }

    /// Sletter de eldste innslagene til indeksen er innenfor taket.
    /// Innslag som ikke lar seg parse rangeres som timestamp 0 og ryker
    /// først. Indeksen skrives om til slutt, i rangert rekkefølge.
    fn enforce_retention(&self, suffix: &str) {
        let index = self.read_index(suffix);
        if index.len() <= self.max_stored {
            return;
        }

        let mut ranked: Vec<(String, i64)> = index
            .iter()
            .map(|id| {
                let ts = self
                    .kv
                    .get(&self.entry_key(suffix, id))
                    .and_then(|raw| serde_json::from_str::<StoredAnalysis>(&raw).ok())
                    .map(|stored| stored.timestamp)
                    .unwrap_or(0);
                (id.clone(), ts)
            })
            .collect();
        // stabil sortering → like timestamps beholder indeks-rekkefølgen
        ranked.sort_by_key(|(_, ts)| *ts);

        let excess = ranked.len() - self.max_stored;
        for (id, _) in &ranked[..excess] {
            self.kv.remove(&self.entry_key(suffix, id));
            log::debug!("evicted analysis {id} for '{suffix}' (retention cap {})", self.max_stored);
        }

        let keep: Vec<String> = ranked[excess..].iter().map(|(id, _)| id.clone()).collect();
        if let Err(e) = self.write_index(suffix, &keep) {
            log::warn!("could not rewrite index for '{suffix}' after eviction: {e}");
        }
    }

    /// Sammendrag for alle lagrede analyser, nyeste først. Korrupte innslag
    /// hoppes over med en logglinje – ett råttent innslag feller ikke listen.
    pub fn list_summaries(&self, identity: Option<&str>) -> Vec<AnalysisSummary> {
        if !self.kv.available() {
            return Vec::new();
        }

        let suffix = Self::suffix(identity);
        let index = self.read_index(&suffix);
        let mut summaries = Vec::with_capacity(index.len());

        for id in &index {
            let Some(raw) = self.kv.get(&self.entry_key(&suffix, id)) else {
                continue;
            };
            match serde_json::from_str::<StoredAnalysis>(&raw) {
                Ok(stored) => summaries.push(summarize(&stored)),
                Err(e) => log::warn!("skipping unreadable analysis {id}: {e}"),
            }
        }

        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        summaries
    }

    /// Fullt resultat for en id, eller None (blank id, ukjent id, korrupt
    /// innslag). Kaster aldri for manglende treff.
    pub fn get_by_id(&self, id: &str, identity: Option<&str>) -> Option<AnalysisResult> {
        if !self.kv.available() || id.trim().is_empty() {
            return None;
        }

        let suffix = Self::suffix(identity);
        let raw = self.kv.get(&self.entry_key(&suffix, id))?;
        match serde_json::from_str::<StoredAnalysis>(&raw) {
            Ok(stored) => Some(stored.result),
            Err(e) => {
                log::warn!("unreadable analysis {id}: {e}");
                None
            }
        }
    }

    /// true hvis innslaget fantes og ble fjernet (også fra indeksen).
    pub fn delete_by_id(&self, id: &str, identity: Option<&str>) -> bool {
        if !self.kv.available() || id.trim().is_empty() {
            return false;
        }

        let suffix = Self::suffix(identity);
        let key = self.entry_key(&suffix, id);
        if self.kv.get(&key).is_none() {
            return false;
        }

        self.kv.remove(&key);

        let index = self.read_index(&suffix);
        let remaining: Vec<String> = index.into_iter().filter(|x| x != id).collect();
        if let Err(e) = self.write_index(&suffix, &remaining) {
            log::warn!("could not rewrite index for '{suffix}' after delete: {e}");
        }

        true
    }

    pub fn count(&self, identity: Option<&str>) -> usize {
        if !self.kv.available() {
            return 0;
        }
        self.read_index(&Self::suffix(identity)).len()
    }

    /// Fjerner alle innslag for identiteten og nullstiller indeksen.
    /// Returnerer antall fjernet. Andre identiteter berøres ikke.
    pub fn clear_all(&self, identity: Option<&str>) -> usize {
        if !self.kv.available() {
            return 0;
        }

        let suffix = Self::suffix(identity);
        let index = self.read_index(&suffix);
        let mut removed = 0;
        for id in &index {
            self.kv.remove(&self.entry_key(&suffix, id));
            removed += 1;
        }
        self.kv.remove(&self.index_key(&suffix));
        removed
    }

    pub fn exists(&self, id: &str, identity: Option<&str>) -> bool {
        if !self.kv.available() || id.trim().is_empty() {
            return false;
        }
        let suffix = Self::suffix(identity);
        self.kv.get(&self.entry_key(&suffix, id)).is_some()
    }

    /// Formatert JSON-eksport av et lagret resultat.
    pub fn export_json(&self, id: &str, identity: Option<&str>) -> Result<Vec<u8>, ApiError> {
        let Some(result) = self.get_by_id(id, identity) else {
            return Err(ApiError::NotFound(format!("analysis not found: {id}")));
        };
        serde_json::to_vec_pretty(&result)
            .map_err(|e| ApiError::Serialization(format!("could not export analysis {id}: {e}")))
    }

    /// Skriver eksporten til en fil (nedlastings-flyten).
    pub fn export_to_file(
        &self,
        id: &str,
        path: &Path,
        identity: Option<&str>,
    ) -> Result<(), ApiError> {
        let bytes = self.export_json(id, identity)?;
        fs::write(path, bytes).map_err(|e| {
            ApiError::StorageUnavailable(format!(
                "could not write export to {}: {e}",
                path.display()
            ))
        })
    }
}

fn summarize(stored: &StoredAnalysis) -> AnalysisSummary {
    let result = &stored.result;
    AnalysisSummary {
        id: stored.id.clone(),
        date: millis_to_iso(stored.timestamp),
        timestamp: stored.timestamp,
        score: result.performance_score.overall_score.round() as i64,
        corner_count: result.corners_detected,
        lap_time: result.lap_time,
        grade: result.performance_score.grade.clone(),
        filename: if result.analysis_id.is_empty() {
            None
        } else {
            Some(format!("{}.json", result.analysis_id))
        },
    }
}
