pub mod manager;
pub mod models;
pub mod repository;
pub mod search;

pub use manager::{BookingError, BookingManager, CancelOutcome, CreateBooking, ServiceChoice};
pub use models::{Booking, BookingStatus, ServiceSelection, User};
pub use repository::{BookingStore, CatalogStore, StoreError, TravelStore, UserStore};
pub use search::{FlightQuery, HotelQuery, PackageListing, PackageQuery, PendingSearch};
