// 🗄️ Persistence Gateway - SQLite-backed record collections
//
// Owns the three persisted collections (vehicles, membership_records,
// provider_links) plus the admin session row. The gateway's state is the
// single source of truth: views hold transient copies and refetch on
// every change-feed signal. Every committed mutation dispatches the
// collection's feed channel, which also redundantly refreshes the view
// that issued the write.
//
// No automatic retry: a failed operation surfaces its StorageError and
// the user re-triggers the action.

use crate::entities::{
    FuelType, MembershipDuration, MembershipRecord, ProviderLink, Transmission, Vehicle,
};
use crate::feed::ChangeFeed;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Change-feed channel / table name for the vehicle catalog
pub const VEHICLES: &str = "vehicles";
/// Change-feed channel / table name for membership records
pub const MEMBERSHIP_RECORDS: &str = "membership_records";
/// Change-feed channel / table name for provider links
pub const PROVIDER_LINKS: &str = "provider_links";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

// ============================================================================
// STORAGE ERROR
// ============================================================================

#[derive(Debug)]
pub enum StorageError {
    /// Underlying database failure (I/O, constraint, malformed row)
    Database(rusqlite::Error),
    /// The targeted record does not exist
    NotFound { collection: &'static str, id: String },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "storage failure: {}", e),
            StorageError::NotFound { collection, id } => {
                write!(f, "no record '{}' in {}", id, collection)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Database(e) => Some(e),
            StorageError::NotFound { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e)
    }
}

// ============================================================================
// SCHEMA SETUP
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<(), StorageError> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS vehicles (
            id TEXT PRIMARY KEY,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            year INTEGER NOT NULL,
            price INTEGER NOT NULL,
            monthly_payment INTEGER NOT NULL,
            payment_overridden INTEGER NOT NULL DEFAULT 0,
            image_url TEXT NOT NULL,
            mileage INTEGER,
            transmission TEXT NOT NULL,
            fuel_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS membership_records (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            membership_type TEXT NOT NULL,
            membership_duration TEXT,
            subscription_price INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS provider_links (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admin_sessions (
            token TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            started_at TEXT NOT NULL
        )",
        [],
    )?;

    // Indexes on the default sort columns
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_vehicles_created ON vehicles(created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_members_created ON membership_records(created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_links_name ON provider_links(name)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_timestamp(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    let transmission: String = row.get(9)?;
    let fuel_type: String = row.get(10)?;

    Ok(Vehicle {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        year: row.get(3)?,
        price: row.get(4)?,
        monthly_payment: row.get(5)?,
        payment_overridden: row.get(6)?,
        image_url: row.get(7)?,
        mileage: row.get(8)?,
        transmission: Transmission::parse(&transmission).ok_or(rusqlite::Error::InvalidQuery)?,
        fuel_type: FuelType::parse(&fuel_type).ok_or(rusqlite::Error::InvalidQuery)?,
        created_at: parse_timestamp(row.get(11)?)?,
        updated_at: parse_timestamp(row.get(12)?)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<MembershipRecord> {
    let duration: Option<String> = row.get(5)?;
    let membership_duration = match duration {
        Some(d) => Some(MembershipDuration::parse(&d).ok_or(rusqlite::Error::InvalidQuery)?),
        None => None,
    };

    Ok(MembershipRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        membership_type: row.get(4)?,
        membership_duration,
        subscription_price: row.get(6)?,
        created_at: parse_timestamp(row.get(7)?)?,
        updated_at: parse_timestamp(row.get(8)?)?,
    })
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<ProviderLink> {
    Ok(ProviderLink {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        created_at: parse_timestamp(row.get(3)?)?,
        updated_at: parse_timestamp(row.get(4)?)?,
    })
}

const VEHICLE_COLUMNS: &str = "id, make, model, year, price, monthly_payment, \
     payment_overridden, image_url, mileage, transmission, fuel_type, \
     created_at, updated_at";

const MEMBER_COLUMNS: &str = "id, name, email, phone, membership_type, \
     membership_duration, subscription_price, created_at, updated_at";

const LINK_COLUMNS: &str = "id, name, url, created_at, updated_at";

// ============================================================================
// VEHICLES
// ============================================================================

/// List the catalog, newest listings first by default
pub fn list_vehicles(
    conn: &Connection,
    direction: SortDirection,
) -> Result<Vec<Vehicle>, StorageError> {
    let sql = format!(
        "SELECT {} FROM vehicles ORDER BY created_at {}",
        VEHICLE_COLUMNS,
        direction.as_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let vehicles = stmt
        .query_map([], vehicle_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(vehicles)
}

pub fn get_vehicle(conn: &Connection, id: &str) -> Result<Vehicle, StorageError> {
    let sql = format!("SELECT {} FROM vehicles WHERE id = ?1", VEHICLE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], vehicle_from_row)?;
    match rows.next() {
        Some(vehicle) => Ok(vehicle?),
        None => Err(StorageError::NotFound {
            collection: VEHICLES,
            id: id.to_string(),
        }),
    }
}

pub fn insert_vehicle(conn: &Connection, vehicle: &Vehicle) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO vehicles (
            id, make, model, year, price, monthly_payment, payment_overridden,
            image_url, mileage, transmission, fuel_type, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            vehicle.id,
            vehicle.make,
            vehicle.model,
            vehicle.year,
            vehicle.price,
            vehicle.monthly_payment,
            vehicle.payment_overridden,
            vehicle.image_url,
            vehicle.mileage,
            vehicle.transmission.as_str(),
            vehicle.fuel_type.as_str(),
            vehicle.created_at.to_rfc3339(),
            vehicle.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_vehicle(conn: &Connection, vehicle: &Vehicle) -> Result<(), StorageError> {
    let changed = conn.execute(
        "UPDATE vehicles SET
            make = ?2, model = ?3, year = ?4, price = ?5, monthly_payment = ?6,
            payment_overridden = ?7, image_url = ?8, mileage = ?9,
            transmission = ?10, fuel_type = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            vehicle.id,
            vehicle.make,
            vehicle.model,
            vehicle.year,
            vehicle.price,
            vehicle.monthly_payment,
            vehicle.payment_overridden,
            vehicle.image_url,
            vehicle.mileage,
            vehicle.transmission.as_str(),
            vehicle.fuel_type.as_str(),
            vehicle.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: VEHICLES,
            id: vehicle.id.clone(),
        });
    }
    Ok(())
}

pub fn delete_vehicle(conn: &Connection, id: &str) -> Result<(), StorageError> {
    let changed = conn.execute("DELETE FROM vehicles WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: VEHICLES,
            id: id.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// MEMBERSHIP RECORDS
// ============================================================================

pub fn list_members(
    conn: &Connection,
    direction: SortDirection,
) -> Result<Vec<MembershipRecord>, StorageError> {
    let sql = format!(
        "SELECT {} FROM membership_records ORDER BY created_at {}",
        MEMBER_COLUMNS,
        direction.as_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let members = stmt
        .query_map([], member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(members)
}

pub fn get_member(conn: &Connection, id: &str) -> Result<MembershipRecord, StorageError> {
    let sql = format!(
        "SELECT {} FROM membership_records WHERE id = ?1",
        MEMBER_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], member_from_row)?;
    match rows.next() {
        Some(member) => Ok(member?),
        None => Err(StorageError::NotFound {
            collection: MEMBERSHIP_RECORDS,
            id: id.to_string(),
        }),
    }
}

pub fn insert_member(conn: &Connection, member: &MembershipRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO membership_records (
            id, name, email, phone, membership_type, membership_duration,
            subscription_price, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            member.id,
            member.name,
            member.email,
            member.phone,
            member.membership_type,
            member.membership_duration.map(|d| d.as_str()),
            member.subscription_price,
            member.created_at.to_rfc3339(),
            member.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_member(conn: &Connection, member: &MembershipRecord) -> Result<(), StorageError> {
    let changed = conn.execute(
        "UPDATE membership_records SET
            name = ?2, email = ?3, phone = ?4, membership_type = ?5,
            membership_duration = ?6, subscription_price = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            member.id,
            member.name,
            member.email,
            member.phone,
            member.membership_type,
            member.membership_duration.map(|d| d.as_str()),
            member.subscription_price,
            member.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: MEMBERSHIP_RECORDS,
            id: member.id.clone(),
        });
    }
    Ok(())
}

pub fn delete_member(conn: &Connection, id: &str) -> Result<(), StorageError> {
    let changed = conn.execute("DELETE FROM membership_records WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: MEMBERSHIP_RECORDS,
            id: id.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// PROVIDER LINKS
// ============================================================================

/// List provider links; the checkout dialog wants them alphabetical
pub fn list_provider_links(
    conn: &Connection,
    direction: SortDirection,
) -> Result<Vec<ProviderLink>, StorageError> {
    let sql = format!(
        "SELECT {} FROM provider_links ORDER BY name {}",
        LINK_COLUMNS,
        direction.as_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let links = stmt
        .query_map([], link_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(links)
}

pub fn get_provider_link(conn: &Connection, id: &str) -> Result<ProviderLink, StorageError> {
    let sql = format!("SELECT {} FROM provider_links WHERE id = ?1", LINK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], link_from_row)?;
    match rows.next() {
        Some(link) => Ok(link?),
        None => Err(StorageError::NotFound {
            collection: PROVIDER_LINKS,
            id: id.to_string(),
        }),
    }
}

pub fn insert_provider_link(conn: &Connection, link: &ProviderLink) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO provider_links (id, name, url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            link.id,
            link.name,
            link.url,
            link.created_at.to_rfc3339(),
            link.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_provider_link(conn: &Connection, link: &ProviderLink) -> Result<(), StorageError> {
    let changed = conn.execute(
        "UPDATE provider_links SET name = ?2, url = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            link.id,
            link.name,
            link.url,
            link.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: PROVIDER_LINKS,
            id: link.id.clone(),
        });
    }
    Ok(())
}

pub fn delete_provider_link(conn: &Connection, id: &str) -> Result<(), StorageError> {
    let changed = conn.execute("DELETE FROM provider_links WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StorageError::NotFound {
            collection: PROVIDER_LINKS,
            id: id.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// STORE
// ============================================================================

/// Gateway handle: a connection plus the change feed it dispatches.
/// Every successful mutation notifies the collection's channel, so the
/// writing view refreshes through the same path as everyone else.
pub struct Store {
    conn: Connection,
    feed: ChangeFeed,
}

impl Store {
    pub fn new(conn: Connection) -> Result<Self, StorageError> {
        Self::with_feed(conn, ChangeFeed::new())
    }

    pub fn with_feed(conn: Connection, feed: ChangeFeed) -> Result<Self, StorageError> {
        setup_database(&conn)?;
        Ok(Store { conn, feed })
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Handle to the change feed; clone one per subscribing view
    pub fn feed(&self) -> ChangeFeed {
        self.feed.clone()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------

    pub fn list_vehicles(&self, direction: SortDirection) -> Result<Vec<Vehicle>, StorageError> {
        list_vehicles(&self.conn, direction)
    }

    pub fn get_vehicle(&self, id: &str) -> Result<Vehicle, StorageError> {
        get_vehicle(&self.conn, id)
    }

    pub fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StorageError> {
        insert_vehicle(&self.conn, vehicle)?;
        self.feed.dispatch(VEHICLES);
        Ok(())
    }

    pub fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), StorageError> {
        update_vehicle(&self.conn, vehicle)?;
        self.feed.dispatch(VEHICLES);
        Ok(())
    }

    pub fn delete_vehicle(&self, id: &str) -> Result<(), StorageError> {
        delete_vehicle(&self.conn, id)?;
        self.feed.dispatch(VEHICLES);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Membership records
    // ------------------------------------------------------------------

    pub fn list_members(
        &self,
        direction: SortDirection,
    ) -> Result<Vec<MembershipRecord>, StorageError> {
        list_members(&self.conn, direction)
    }

    pub fn get_member(&self, id: &str) -> Result<MembershipRecord, StorageError> {
        get_member(&self.conn, id)
    }

    pub fn insert_member(&self, member: &MembershipRecord) -> Result<(), StorageError> {
        insert_member(&self.conn, member)?;
        self.feed.dispatch(MEMBERSHIP_RECORDS);
        Ok(())
    }

    pub fn update_member(&self, member: &MembershipRecord) -> Result<(), StorageError> {
        update_member(&self.conn, member)?;
        self.feed.dispatch(MEMBERSHIP_RECORDS);
        Ok(())
    }

    pub fn delete_member(&self, id: &str) -> Result<(), StorageError> {
        delete_member(&self.conn, id)?;
        self.feed.dispatch(MEMBERSHIP_RECORDS);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Provider links
    // ------------------------------------------------------------------

    pub fn list_provider_links(
        &self,
        direction: SortDirection,
    ) -> Result<Vec<ProviderLink>, StorageError> {
        list_provider_links(&self.conn, direction)
    }

    pub fn get_provider_link(&self, id: &str) -> Result<ProviderLink, StorageError> {
        get_provider_link(&self.conn, id)
    }

    pub fn insert_provider_link(&self, link: &ProviderLink) -> Result<(), StorageError> {
        insert_provider_link(&self.conn, link)?;
        self.feed.dispatch(PROVIDER_LINKS);
        Ok(())
    }

    pub fn update_provider_link(&self, link: &ProviderLink) -> Result<(), StorageError> {
        update_provider_link(&self.conn, link)?;
        self.feed.dispatch(PROVIDER_LINKS);
        Ok(())
    }

    pub fn delete_provider_link(&self, id: &str) -> Result<(), StorageError> {
        delete_provider_link(&self.conn, id)?;
        self.feed.dispatch(PROVIDER_LINKS);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
