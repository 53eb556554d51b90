use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use wayfare_booking::PendingSearch;

/// Short-lived holder bridging a search to the booking that follows it.
///
/// A successful search is stored under a token; the booking request hands
/// the token back instead of the app keeping ambient per-visitor state.
/// Entries expire after the TTL and are swept on the next insert.
pub struct PendingSearchStore {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, StoredSearch>>,
}

struct StoredSearch {
    search: PendingSearch,
    stored_at: Instant,
}

impl PendingSearchStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn put(&self, search: PendingSearch) -> Uuid {
        let token = Uuid::new_v4();
        let mut entries = self.entries.lock().expect("pending search lock poisoned");
        let now = Instant::now();
        entries.retain(|_, stored| now.duration_since(stored.stored_at) < self.ttl);
        entries.insert(
            token,
            StoredSearch {
                search,
                stored_at: now,
            },
        );
        debug!(%token, live = entries.len(), "pending search stored");
        token
    }

    pub fn get(&self, token: Uuid) -> Option<PendingSearch> {
        let entries = self.entries.lock().expect("pending search lock poisoned");
        let stored = entries.get(&token)?;
        if stored.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(stored.search.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_catalog::ServiceKind;

    fn search() -> PendingSearch {
        PendingSearch {
            kind: ServiceKind::Flight,
            destination: "Lisbon".to_string(),
            guests: 2,
            departure_city: Some("Oslo".to_string()),
            departure_date: None,
            check_in: None,
            check_out: None,
            min_price: None,
            max_price: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let store = PendingSearchStore::new(Duration::from_secs(60));
        let token = store.put(search());
        let loaded = store.get(token).expect("token should be live");
        assert_eq!(loaded.destination, "Lisbon");
        assert_eq!(loaded.guests, 2);
    }

    #[test]
    fn test_expired_token_is_gone() {
        let store = PendingSearchStore::new(Duration::ZERO);
        let token = store.put(search());
        assert!(store.get(token).is_none());
    }

    #[test]
    fn test_unknown_token_is_none() {
        let store = PendingSearchStore::new(Duration::from_secs(60));
        assert!(store.get(Uuid::new_v4()).is_none());
    }
}
