//! Postgres store.
//!
//! Uses the runtime query API throughout. Booking commits run inside one
//! transaction and take `FOR UPDATE` row locks on every inventory row they
//! adjust, so two racing reservations for the last unit serialize and only
//! one of them sees it available.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use wayfare_booking::{
    Booking, BookingStatus, BookingStore, CatalogStore, FlightQuery, HotelQuery, PackageListing,
    PackageQuery, ServiceSelection, StoreError, User, UserStore,
};
use wayfare_catalog::{ledger, AdjustmentPlan, Flight, Hotel, ItemKind, LedgerError, PackageDeal};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock, check and adjust every inventory row a plan touches, inside
    /// the caller's transaction.
    async fn apply_plan(
        tx: &mut Transaction<'_, Postgres>,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError> {
        for entry in plan.entries() {
            let (select, update, label) = match entry.kind {
                ItemKind::Flight => (
                    "SELECT availability FROM flights WHERE id = $1 FOR UPDATE",
                    "UPDATE flights SET availability = $1 WHERE id = $2",
                    "flight",
                ),
                ItemKind::Hotel => (
                    "SELECT availability FROM hotels WHERE id = $1 FOR UPDATE",
                    "UPDATE hotels SET availability = $1 WHERE id = $2",
                    "hotel",
                ),
            };

            let row = sqlx::query(select)
                .bind(entry.item_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(StoreError::persistence)?
                .ok_or_else(|| StoreError::NotFound(format!("{label} {}", entry.item_id)))?;
            let available: i32 = row.try_get("availability").map_err(StoreError::persistence)?;

            let next = ledger::apply(available, entry.delta).map_err(|err| match err {
                LedgerError::InsufficientCapacity {
                    requested,
                    available,
                } => StoreError::InsufficientCapacity {
                    item_id: entry.item_id,
                    requested,
                    available,
                },
            })?;

            sqlx::query(update)
                .bind(next)
                .bind(entry.item_id)
                .execute(&mut **tx)
                .await
                .map_err(StoreError::persistence)?;
        }
        Ok(())
    }
}

fn map_db_err(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            StoreError::Duplicate(what.to_string())
        }
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
        {
            StoreError::Conflict(format!("{what} is still referenced"))
        }
        _ => StoreError::persistence(err),
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    departure_city: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    flight_number: String,
    availability: i32,
    price: f64,
}

impl FlightRow {
    fn into_domain(self) -> Result<Flight, StoreError> {
        Ok(Flight::restore(
            self.id,
            self.airline,
            self.departure_city,
            self.destination,
            self.departure_time,
            self.arrival_time,
            self.flight_number,
            self.availability,
            self.price,
        )?)
    }
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    location: String,
    rating: i32,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    availability: i32,
    price: f64,
}

impl HotelRow {
    fn into_domain(self) -> Result<Hotel, StoreError> {
        Ok(Hotel::restore(
            self.id,
            self.name,
            self.location,
            self.rating,
            self.check_in_date,
            self.check_out_date,
            self.availability,
            self.price,
        )?)
    }
}

#[derive(sqlx::FromRow)]
struct PackageDealRow {
    id: Uuid,
    flight_id: Uuid,
    hotel_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price: f64,
}

impl PackageDealRow {
    fn into_domain(self) -> Result<PackageDeal, StoreError> {
        Ok(PackageDeal::restore(
            self.id,
            self.flight_id,
            self.hotel_id,
            self.start_date,
            self.end_date,
            self.price,
        )?)
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    guest_name: String,
    guest_email: String,
    destination: String,
    booking_date: DateTime<Utc>,
    num_people: i32,
    total_price: f64,
    service_type: String,
    flight_id: Option<Uuid>,
    hotel_id: Option<Uuid>,
    package_deal_id: Option<Uuid>,
    status: String,
}

impl BookingRow {
    fn into_domain(self) -> Result<Booking, StoreError> {
        let service = match (
            self.service_type.as_str(),
            self.flight_id,
            self.hotel_id,
            self.package_deal_id,
        ) {
            ("FLIGHT", Some(flight_id), None, None) => ServiceSelection::Flight { flight_id },
            ("HOTEL", None, Some(hotel_id), None) => ServiceSelection::Hotel { hotel_id },
            ("PACKAGE_DEAL", Some(flight_id), Some(hotel_id), Some(package_deal_id)) => {
                ServiceSelection::PackageDeal {
                    package_deal_id,
                    flight_id,
                    hotel_id,
                }
            }
            _ => {
                return Err(StoreError::Persistence(format!(
                    "booking {} has inconsistent service references",
                    self.id
                )))
            }
        };
        let status = match self.status.as_str() {
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" => BookingStatus::Cancelled,
            other => {
                return Err(StoreError::Persistence(format!(
                    "booking {} has unknown status {other}",
                    self.id
                )))
            }
        };
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            guest_name: self.guest_name,
            guest_email: self.guest_email,
            destination: self.destination,
            booking_date: self.booking_date,
            num_people: self.num_people,
            total_price: self.total_price,
            service,
            status,
        })
    }
}

fn booking_columns(booking: &Booking) -> (&'static str, Option<Uuid>, Option<Uuid>, Option<Uuid>) {
    match booking.service {
        ServiceSelection::Flight { flight_id } => ("FLIGHT", Some(flight_id), None, None),
        ServiceSelection::Hotel { hotel_id } => ("HOTEL", None, Some(hotel_id), None),
        ServiceSelection::PackageDeal {
            package_deal_id,
            flight_id,
            hotel_id,
        } => (
            "PACKAGE_DEAL",
            Some(flight_id),
            Some(hotel_id),
            Some(package_deal_id),
        ),
    }
}

fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::Cancelled => "CANCELLED",
    }
}

const FLIGHT_COLS: &str =
    "id, airline, departure_city, destination, departure_time, arrival_time, flight_number, availability, price";
const HOTEL_COLS: &str =
    "id, name, location, rating, check_in_date, check_out_date, availability, price";
const BOOKING_COLS: &str = "id, user_id, guest_name, guest_email, destination, booking_date, num_people, total_price, service_type, flight_id, hotel_id, package_deal_id, status";

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO flights (id, airline, departure_city, destination, departure_time, arrival_time, flight_number, availability, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(flight.id)
        .bind(&flight.airline)
        .bind(&flight.departure_city)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(&flight.flight_number)
        .bind(flight.availability())
        .bind(flight.price())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "flight"))?;
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE flights SET airline = $1, departure_city = $2, destination = $3, departure_time = $4, \
             arrival_time = $5, flight_number = $6, availability = $7, price = $8 WHERE id = $9",
        )
        .bind(&flight.airline)
        .bind(&flight.departure_city)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(&flight.flight_number)
        .bind(flight.availability())
        .bind(flight.price())
        .bind(flight.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("flight {}", flight.id)));
        }
        Ok(())
    }

    async fn delete_flight(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "flight"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("flight {id}")));
        }
        Ok(())
    }

    async fn flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLS} FROM flights WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        row.map(FlightRow::into_domain).transpose()
    }

    async fn list_flights(&self) -> Result<Vec<Flight>, StoreError> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLS} FROM flights ORDER BY departure_time"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        rows.into_iter().map(FlightRow::into_domain).collect()
    }

    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO hotels (id, name, location, rating, check_in_date, check_out_date, availability, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(&hotel.location)
        .bind(hotel.rating)
        .bind(hotel.check_in_date)
        .bind(hotel.check_out_date)
        .bind(hotel.availability())
        .bind(hotel.price())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "hotel"))?;
        Ok(())
    }

    async fn update_hotel(&self, hotel: &Hotel) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE hotels SET name = $1, location = $2, rating = $3, check_in_date = $4, \
             check_out_date = $5, availability = $6, price = $7 WHERE id = $8",
        )
        .bind(&hotel.name)
        .bind(&hotel.location)
        .bind(hotel.rating)
        .bind(hotel.check_in_date)
        .bind(hotel.check_out_date)
        .bind(hotel.availability())
        .bind(hotel.price())
        .bind(hotel.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("hotel {}", hotel.id)));
        }
        Ok(())
    }

    async fn delete_hotel(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "hotel"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("hotel {id}")));
        }
        Ok(())
    }

    async fn hotel(&self, id: Uuid) -> Result<Option<Hotel>, StoreError> {
        let row = sqlx::query_as::<_, HotelRow>(&format!(
            "SELECT {HOTEL_COLS} FROM hotels WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        row.map(HotelRow::into_domain).transpose()
    }

    async fn list_hotels(&self) -> Result<Vec<Hotel>, StoreError> {
        let rows = sqlx::query_as::<_, HotelRow>(&format!(
            "SELECT {HOTEL_COLS} FROM hotels ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        rows.into_iter().map(HotelRow::into_domain).collect()
    }

    async fn insert_package_deal(&self, deal: &PackageDeal) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO package_deals (id, flight_id, hotel_id, start_date, end_date, price) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(deal.id)
        .bind(deal.flight_id)
        .bind(deal.hotel_id)
        .bind(deal.start_date)
        .bind(deal.end_date)
        .bind(deal.price())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "package deal"))?;
        Ok(())
    }

    async fn delete_package_deal(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM package_deals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "package deal"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("package deal {id}")));
        }
        Ok(())
    }

    async fn package_deal(&self, id: Uuid) -> Result<Option<PackageDeal>, StoreError> {
        let row = sqlx::query_as::<_, PackageDealRow>(
            "SELECT id, flight_id, hotel_id, start_date, end_date, price FROM package_deals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        row.map(PackageDealRow::into_domain).transpose()
    }

    async fn package_listing(&self, id: Uuid) -> Result<Option<PackageListing>, StoreError> {
        let Some(deal) = self.package_deal(id).await? else {
            return Ok(None);
        };
        let Some(flight) = self.flight(deal.flight_id).await? else {
            return Ok(None);
        };
        let Some(hotel) = self.hotel(deal.hotel_id).await? else {
            return Ok(None);
        };
        Ok(Some(PackageListing {
            deal,
            flight,
            hotel,
        }))
    }

    async fn list_package_deals(&self) -> Result<Vec<PackageListing>, StoreError> {
        let rows = sqlx::query_as::<_, PackageDealRow>(
            "SELECT id, flight_id, hotel_id, start_date, end_date, price FROM package_deals ORDER BY start_date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            let deal = row.into_domain()?;
            if let Some(listing) = self.package_listing(deal.id).await? {
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>, StoreError> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLS} FROM flights \
             WHERE destination ILIKE '%' || $1 || '%' AND availability >= $2 \
             ORDER BY departure_time"
        ))
        .bind(&query.destination_contains)
        .bind(query.min_seats)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        let flights = rows
            .into_iter()
            .map(FlightRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        // Same predicate as the in-memory store for the remaining filters.
        Ok(flights
            .into_iter()
            .filter(|flight| query.matches(flight))
            .collect())
    }

    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<Hotel>, StoreError> {
        let rows = sqlx::query_as::<_, HotelRow>(&format!(
            "SELECT {HOTEL_COLS} FROM hotels \
             WHERE location ILIKE '%' || $1 || '%' AND availability >= $2 \
             ORDER BY name"
        ))
        .bind(&query.location_contains)
        .bind(query.min_rooms)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        let hotels = rows
            .into_iter()
            .map(HotelRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hotels
            .into_iter()
            .filter(|hotel| query.matches(hotel))
            .collect())
    }

    async fn search_package_deals(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<PackageListing>, StoreError> {
        let listings = self.list_package_deals().await?;
        Ok(listings
            .into_iter()
            .filter(|listing| query.matches(&listing.deal, &listing.flight, &listing.hotel))
            .collect())
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        row.map(BookingRow::into_domain).transpose()
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        rows.into_iter().map(BookingRow::into_domain).collect()
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings ORDER BY booking_date DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        rows.into_iter().map(BookingRow::into_domain).collect()
    }

    async fn create_booking(
        &self,
        booking: &Booking,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::persistence)?;
        Self::apply_plan(&mut tx, plan).await?;

        let (service_type, flight_id, hotel_id, package_deal_id) = booking_columns(booking);
        sqlx::query(
            "INSERT INTO bookings (id, user_id, guest_name, guest_email, destination, booking_date, \
             num_people, total_price, service_type, flight_id, hotel_id, package_deal_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(&booking.guest_name)
        .bind(&booking.guest_email)
        .bind(&booking.destination)
        .bind(booking.booking_date)
        .bind(booking.num_people)
        .bind(booking.total_price)
        .bind(service_type)
        .bind(flight_id)
        .bind(hotel_id)
        .bind(package_deal_id)
        .bind(status_label(booking.status))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_err(e, "booking"))?;

        tx.commit().await.map_err(StoreError::persistence)?;
        Ok(())
    }

    async fn resize_booking(
        &self,
        id: Uuid,
        num_people: i32,
        total_price: f64,
        plan: &AdjustmentPlan,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::persistence)?;

        let row = sqlx::query("SELECT status FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::persistence)?
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))?;
        let status: String = row.try_get("status").map_err(StoreError::persistence)?;
        if status != "CONFIRMED" {
            return Err(StoreError::Conflict(format!("booking {id} is not confirmed")));
        }

        Self::apply_plan(&mut tx, plan).await?;

        sqlx::query("UPDATE bookings SET num_people = $1, total_price = $2 WHERE id = $3")
            .bind(num_people)
            .bind(total_price)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::persistence)?;

        tx.commit().await.map_err(StoreError::persistence)?;
        Ok(())
    }

    async fn cancel_booking(&self, id: Uuid, plan: &AdjustmentPlan) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::persistence)?;

        // Guard the flip so a lost race cannot release capacity twice.
        let flipped = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED' WHERE id = $1 AND status = 'CONFIRMED'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::persistence)?;

        if flipped.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 AS one FROM bookings WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::persistence)?
                .is_some();
            if !exists {
                return Err(StoreError::NotFound(format!("booking {id}")));
            }
            return Ok(false);
        }

        Self::apply_plan(&mut tx, plan).await?;
        tx.commit().await.map_err(StoreError::persistence)?;
        Ok(true)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &format!("email {}", user.email)))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &format!("email {}", user.email)))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        Ok(row.map(UserRow::into_domain))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;
        Ok(row.map(UserRow::into_domain))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}
