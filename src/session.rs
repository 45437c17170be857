//! Session store - explicit keyed state for a debate being analyzed
//!
//! Sessions are created with `create`, touched on every access that records
//! data, and leave the store either through `remove` or `evict_idle`.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::rubric::DebateFormat;

/// One analyzed intervention within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAnalysis {
    pub phase_id: String,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub format: DebateFormat,
    pub analyses: Vec<PhaseAnalysis>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its id
    pub fn create(&self, format: DebateFormat) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.sessions.insert(
            session_id.clone(),
            SessionState {
                session_id: session_id.clone(),
                format,
                analyses: Vec::new(),
                created_at: now,
                last_access: now,
            },
        );
        info!("Created {} session {}", format, session_id);
        session_id
    }

    /// Snapshot of a session
    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Refresh the session's last access time. Returns false if unknown.
    pub fn touch(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                entry.last_access = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Append an analysis result to a session.
    ///
    /// Fails for an unknown session or a phase id that the session's debate
    /// format does not define.
    pub fn record_analysis(
        &self,
        session_id: &str,
        phase_id: &str,
        result: AnalysisResult,
    ) -> Result<(), String> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| format!("Unknown session: {}", session_id))?;

        if entry.format.profile().phase(phase_id).is_none() {
            return Err(format!(
                "Phase {} does not exist in format {}",
                phase_id, entry.format
            ));
        }

        entry.analyses.push(PhaseAnalysis {
            phase_id: phase_id.to_string(),
            result,
        });
        entry.last_access = Utc::now();
        debug!(
            "Session {}: recorded analysis for phase {} ({} total)",
            session_id,
            phase_id,
            entry.analyses.len()
        );
        Ok(())
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionState> {
        let removed = self.sessions.remove(session_id).map(|(_, state)| state);
        if removed.is_some() {
            info!("Removed session {}", session_id);
        }
        removed
    }

    /// Remove every session idle for longer than `max_idle`; returns their ids
    pub fn evict_idle(&self, max_idle: Duration) -> Vec<String> {
        self.evict_idle_at(Utc::now(), max_idle)
    }

    fn evict_idle_at(&self, now: DateTime<Utc>, max_idle: Duration) -> Vec<String> {
        let candidates = self.idle_ids(now, max_idle);
        let evicted = self.remove_still_idle(candidates, now, max_idle);
        if !evicted.is_empty() {
            info!("Evicted {} idle sessions", evicted.len());
        }
        evicted
    }

    fn idle_ids(&self, now: DateTime<Utc>, max_idle: Duration) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|entry| is_idle(entry.value(), now, max_idle))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Idleness is re-checked under the shard lock; a session touched since
    /// the scan stays.
    fn remove_still_idle(
        &self,
        candidates: Vec<String>,
        now: DateTime<Utc>,
        max_idle: Duration,
    ) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|session_id| {
                self.sessions
                    .remove_if(session_id, |_, state| is_idle(state, now, max_idle))
                    .is_some()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn is_idle(state: &SessionState, now: DateTime<Utc>, max_idle: Duration) -> bool {
    now - state.last_access > max_idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisMetadata;
    use crate::providers::RecordingRef;
    use std::collections::BTreeMap;

    fn empty_result() -> AnalysisResult {
        AnalysisResult {
            transcript: vec![],
            metrics: BTreeMap::new(),
            metadata: AnalysisMetadata {
                request_id: Uuid::new_v4(),
                source: RecordingRef::new("intro.wav"),
                speakers: vec![],
                expected_speakers: Some(1),
                duration_seconds: 0.0,
                analyzed_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        let id = store.create(DebateFormat::Upct);

        let state = store.get(&id).unwrap();
        assert_eq!(state.format, DebateFormat::Upct);
        assert!(state.analyses.is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_record_analysis_checks_phase() {
        let store = SessionStore::new();
        let id = store.create(DebateFormat::Retor);

        assert!(store
            .record_analysis(&id, "contextualizacion", empty_result())
            .is_ok());
        assert!(store.record_analysis(&id, "refutacion_1", empty_result()).is_err());
        assert!(store
            .record_analysis("missing", "contextualizacion", empty_result())
            .is_err());

        let state = store.get(&id).unwrap();
        assert_eq!(state.analyses.len(), 1);
        assert_eq!(state.analyses[0].phase_id, "contextualizacion");
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        let id = store.create(DebateFormat::Upct);
        assert!(store.remove(&id).is_some());
        assert!(store.remove(&id).is_none());
        assert!(!store.touch(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_idle() {
        let store = SessionStore::new();
        let stale = store.create(DebateFormat::Upct);
        let fresh = store.create(DebateFormat::Retor);

        let later = Utc::now() + Duration::minutes(45);
        if let Some(mut entry) = store.sessions.get_mut(&fresh) {
            entry.last_access = later;
        }

        let evicted = store.evict_idle_at(later, Duration::minutes(30));
        assert_eq!(evicted, vec![stale.clone()]);
        assert!(store.get(&stale).is_none());
        assert!(store.get(&fresh).is_some());
    }

    #[test]
    fn test_session_refreshed_after_scan_survives_eviction() {
        let store = SessionStore::new();
        let busy = store.create(DebateFormat::Upct);
        let stale = store.create(DebateFormat::Upct);

        let later = Utc::now() + Duration::minutes(45);
        let max_idle = Duration::minutes(30);
        let mut candidates = store.idle_ids(later, max_idle);
        candidates.sort();
        let mut expected = vec![busy.clone(), stale.clone()];
        expected.sort();
        assert_eq!(candidates, expected);

        // Activity lands between the scan and the removal
        if let Some(mut entry) = store.sessions.get_mut(&busy) {
            entry.last_access = later;
        }
        store
            .record_analysis(&busy, "introduccion", empty_result())
            .unwrap();

        let evicted = store.remove_still_idle(candidates, later, max_idle);
        assert_eq!(evicted, vec![stale.clone()]);
        let kept = store.get(&busy).unwrap();
        assert_eq!(kept.analyses.len(), 1);
        assert!(store.get(&stale).is_none());
    }

    #[test]
    fn test_concurrent_touch_during_eviction_keeps_sessions() {
        let store = std::sync::Arc::new(SessionStore::new());
        let ids: Vec<String> = (0..2_000).map(|_| store.create(DebateFormat::Retor)).collect();
        let later = Utc::now() + Duration::minutes(45);

        let toucher = {
            let store = store.clone();
            let ids = ids.clone();
            std::thread::spawn(move || {
                let mut touched = Vec::new();
                for id in ids.iter().rev() {
                    if let Some(mut entry) = store.sessions.get_mut(id) {
                        entry.last_access = later;
                        touched.push(id.clone());
                    }
                }
                touched
            })
        };
        let evicted = store.evict_idle_at(later, Duration::minutes(30));
        let touched = toucher.join().unwrap();

        for id in &touched {
            assert!(!evicted.contains(id), "touched session {} was evicted", id);
            assert!(store.get(id).is_some());
        }
        assert_eq!(touched.len() + evicted.len(), ids.len());
    }
}
