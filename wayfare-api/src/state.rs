use std::sync::Arc;

use wayfare_booking::{BookingManager, TravelStore};
use wayfare_store::PendingSearchStore;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub admin_key: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TravelStore>,
    pub manager: Arc<BookingManager>,
    pub searches: Arc<PendingSearchStore>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TravelStore>,
        searches: Arc<PendingSearchStore>,
        auth: AuthConfig,
    ) -> Self {
        let manager = Arc::new(BookingManager::new(store.clone()));
        Self {
            store,
            manager,
            searches,
            auth,
        }
    }
}
