use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::InitialState;
use crate::store::{
    StateStore, StoreError, CURRENT_SITE_ID, CURRENT_SITE_URL, LAST_ROTATION, STATE_VERSION,
};

/// RFC 3339 in UTC with a `Z` suffix, fractional seconds only when non-zero.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// RotationState
// ---------------------------------------------------------------------------

/// The single global rotation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationState {
    pub current_site_url: Option<String>,
    pub current_site_id: Option<String>,
    pub last_rotation: Option<DateTime<Utc>>,
    pub version: u64,
}

impl RotationState {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub async fn load(store: &dyn StateStore) -> Result<Self, StoreError> {
        let current_site_url = non_empty(store.get(CURRENT_SITE_URL).await?);
        let current_site_id = non_empty(store.get(CURRENT_SITE_ID).await?);
        let last_rotation = match non_empty(store.get(LAST_ROTATION).await?) {
            Some(raw) => {
                let parsed = parse_timestamp(&raw);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "ignoring unparsable last-rotation timestamp");
                }
                parsed
            }
            None => None,
        };
        let version = store
            .get(STATE_VERSION)
            .await?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        Ok(Self {
            current_site_url,
            current_site_id,
            last_rotation,
            version,
        })
    }

    /// Like [`load`](Self::load), but an empty store reports the configured
    /// initial values instead.
    pub async fn load_or_initial(
        store: &dyn StateStore,
        initial: &InitialState,
    ) -> Result<Self, StoreError> {
        let state = Self::load(store).await?;
        if !state.is_empty() {
            return Ok(state);
        }
        Ok(Self::from_initial(initial))
    }

    /// The configured seed record, version 0. Empty when nothing is seeded.
    pub fn from_initial(initial: &InitialState) -> Self {
        Self {
            current_site_url: initial.current_site_url.clone(),
            current_site_id: initial.current_site_id.clone(),
            last_rotation: initial.last_rotation.as_deref().and_then(parse_timestamp),
            version: 0,
        }
    }

    /// Write every field in one `set_many` call, bumping the version.
    pub async fn save(&mut self, store: &dyn StateStore) -> Result<(), StoreError> {
        let next_version = self.version + 1;
        let mut entries: Vec<(&str, String)> = Vec::with_capacity(4);
        if let Some(url) = &self.current_site_url {
            entries.push((CURRENT_SITE_URL, url.clone()));
        }
        if let Some(id) = &self.current_site_id {
            entries.push((CURRENT_SITE_ID, id.clone()));
        }
        if let Some(ts) = self.last_rotation {
            entries.push((LAST_ROTATION, format_timestamp(ts)));
        }
        entries.push((STATE_VERSION, next_version.to_string()));
        store.set_many(&entries).await?;
        self.version = next_version;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Point the record at a new site. `last_rotation` never moves backwards.
    pub fn record_rotation(&mut self, url: &str, site_id: Option<&str>, now: DateTime<Utc>) {
        self.current_site_url = Some(url.to_string());
        if let Some(id) = site_id {
            self.current_site_id = Some(id.to_string());
        }
        self.last_rotation = Some(match self.last_rotation {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.current_site_url.is_none()
            && self.current_site_id.is_none()
            && self.last_rotation.is_none()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Manual update
// ---------------------------------------------------------------------------

/// Result of a manual repoint via the update endpoint or `rotor update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub url: String,
    pub site_id: Option<String>,
    pub last_rotation: DateTime<Utc>,
}

/// Merge an operator-supplied URL (and optional id) into the stored record.
/// A missing or blank URL is rejected before anything is read or written.
pub async fn apply_update(
    store: &dyn StateStore,
    url: Option<&str>,
    site_id: Option<&str>,
    now: DateTime<Utc>,
) -> crate::Result<UpdateOutcome> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| crate::RotorError::InvalidRequest("URL is required".to_string()))?;
    let site_id = site_id.map(str::trim).filter(|s| !s.is_empty());

    let mut state = RotationState::load(store).await?;
    state.record_rotation(url, site_id, now);
    state.save(store).await?;
    tracing::info!(url, site_id = ?site_id, "rotation state updated manually");

    Ok(UpdateOutcome {
        url: url.to_string(),
        site_id: site_id.map(str::to_string),
        last_rotation: state.last_rotation.unwrap_or(now),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn format_omits_zero_fraction() {
        assert_eq!(format_timestamp(ts(4)), "2024-01-01T04:00:00Z");
    }

    #[test]
    fn parse_accepts_offsets_and_millis() {
        assert_eq!(parse_timestamp("2024-01-01T04:00:00.000Z"), Some(ts(4)));
        assert_eq!(parse_timestamp("2024-01-01T06:00:00+02:00"), Some(ts(4)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[tokio::test]
    async fn empty_store_loads_default() {
        let store = MemoryStore::new();
        let state = RotationState::load(&store).await.unwrap();
        assert!(state.is_empty());
        assert_eq!(state.version, 0);
    }

    #[tokio::test]
    async fn save_then_load_bumps_version() {
        let store = MemoryStore::new();
        let mut state = RotationState::default();
        state.record_rotation("https://b.example", Some("site-b"), ts(0));
        state.save(&store).await.unwrap();
        state.save(&store).await.unwrap();

        let loaded = RotationState::load(&store).await.unwrap();
        assert_eq!(loaded.current_site_id.as_deref(), Some("site-b"));
        assert_eq!(loaded.last_rotation, Some(ts(0)));
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn unparsable_last_rotation_is_absent() {
        let store = MemoryStore::new();
        store.set(LAST_ROTATION, "not a date").await.unwrap();
        store.set(CURRENT_SITE_URL, "https://a.example").await.unwrap();
        let state = RotationState::load(&store).await.unwrap();
        assert!(state.last_rotation.is_none());
        assert_eq!(state.current_site_url.as_deref(), Some("https://a.example"));
    }

    #[tokio::test]
    async fn initial_values_used_only_when_store_is_empty() {
        let initial = InitialState {
            current_site_url: Some("https://seed.example".into()),
            current_site_id: Some("seed".into()),
            last_rotation: Some("2024-01-01T00:00:00Z".into()),
        };
        let store = MemoryStore::new();
        let seeded = RotationState::load_or_initial(&store, &initial).await.unwrap();
        assert_eq!(seeded.current_site_id.as_deref(), Some("seed"));
        assert_eq!(seeded.last_rotation, Some(ts(0)));

        store.set(CURRENT_SITE_URL, "https://real.example").await.unwrap();
        let real = RotationState::load_or_initial(&store, &initial).await.unwrap();
        assert_eq!(real.current_site_url.as_deref(), Some("https://real.example"));
        assert!(real.current_site_id.is_none());
    }

    #[test]
    fn last_rotation_never_moves_backwards() {
        let mut state = RotationState::default();
        state.record_rotation("https://b.example", Some("b"), ts(5));
        state.record_rotation("https://c.example", Some("c"), ts(3));
        assert_eq!(state.last_rotation, Some(ts(5)));
        assert_eq!(state.current_site_id.as_deref(), Some("c"));
    }

    #[test]
    fn record_without_id_keeps_existing_id() {
        let mut state = RotationState {
            current_site_id: Some("site-a".into()),
            ..Default::default()
        };
        state.record_rotation("https://manual.example", None, ts(1));
        assert_eq!(state.current_site_id.as_deref(), Some("site-a"));
        assert_eq!(state.current_site_url.as_deref(), Some("https://manual.example"));
    }

    #[tokio::test]
    async fn update_without_url_is_rejected_and_mutates_nothing() {
        let store = MemoryStore::new();
        let err = apply_update(&store, None, Some("site-x"), ts(1)).await.unwrap_err();
        assert!(matches!(err, crate::RotorError::InvalidRequest(_)));
        let err = apply_update(&store, Some("   "), None, ts(1)).await.unwrap_err();
        assert!(matches!(err, crate::RotorError::InvalidRequest(_)));
        assert!(RotationState::load(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_into_existing_record() {
        let store = MemoryStore::new();
        store.set(CURRENT_SITE_ID, "site-a").await.unwrap();
        let outcome = apply_update(&store, Some("https://b.example"), None, ts(2))
            .await
            .unwrap();
        assert_eq!(outcome.last_rotation, ts(2));
        assert!(outcome.site_id.is_none());

        let state = RotationState::load(&store).await.unwrap();
        assert_eq!(state.current_site_url.as_deref(), Some("https://b.example"));
        assert_eq!(state.current_site_id.as_deref(), Some("site-a"));
        assert_eq!(state.version, 1);
    }
}
