//! SQLite persistence for chat sessions, listings and CBD reference data

mod chat;
mod listings;
pub mod seed;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Row};
use serde_json::{Map, Value};

use crate::application::errors::StorageError;
use crate::domain::entities::{CbdLocation, Property};

pub use listings::haversine_km;
pub use seed::SeedReport;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_tables()?;
        Ok(db)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER,
                title TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                has_ai_response INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'conversational',
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES chat_sessions(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversation_states (
                session_id TEXT PRIMARY KEY,
                waiting_for_location INTEGER NOT NULL DEFAULT 0,
                waiting_for_cbd_clarification INTEGER NOT NULL DEFAULT 0,
                pending_search_query TEXT NOT NULL DEFAULT '',
                suggested_cbds TEXT NOT NULL DEFAULT '[]',
                selected_cbd INTEGER,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES chat_sessions(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cbd_locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                city TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        // Queried by generated SQL; keep column names stable
        conn.execute(
            "CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                street_address TEXT NOT NULL DEFAULT '',
                suburb TEXT NOT NULL DEFAULT '',
                city TEXT NOT NULL DEFAULT '',
                state_or_region TEXT NOT NULL DEFAULT '',
                country TEXT NOT NULL DEFAULT 'Zimbabwe',
                property_type TEXT,
                bedrooms INTEGER,
                bathrooms INTEGER,
                area REAL,
                price REAL,
                main_image TEXT NOT NULL DEFAULT '',
                latitude REAL,
                longitude REAL,
                listing_type TEXT NOT NULL DEFAULT 'normal',
                is_paid INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS amenities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS property_amenities (
                property_id INTEGER NOT NULL,
                amenity_id INTEGER NOT NULL,
                PRIMARY KEY (property_id, amenity_id),
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE CASCADE,
                FOREIGN KEY (amenity_id) REFERENCES amenities(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS property_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                property_id INTEGER NOT NULL,
                image TEXT NOT NULL,
                FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE CASCADE
            )",
            [],
        )?;

        // Create indexes
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id, created_at)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_sessions_user ON chat_sessions(user_id, updated_at)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_properties_city ON properties(city, suburb)",
            [],
        )?;

        Ok(())
    }

    // Listing management
    pub fn add_property(&self, property: &Property, amenities: &[&str]) -> Result<i64, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO properties (
                title, description, street_address, suburb, city, state_or_region, country,
                property_type, bedrooms, bathrooms, area, price, main_image,
                latitude, longitude, listing_type, is_paid, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            rusqlite::params![
                property.title,
                property.description,
                property.street_address,
                property.suburb,
                property.city,
                property.state_or_region,
                property.country,
                property.property_type,
                property.bedrooms,
                property.bathrooms,
                property.area,
                property.price,
                property.main_image,
                property.latitude,
                property.longitude,
                property.listing_type.as_str(),
                property.is_paid,
                encode_time(&property.created_at),
            ],
        )?;
        let property_id = tx.last_insert_rowid();

        for name in amenities {
            tx.execute("INSERT OR IGNORE INTO amenities (name) VALUES (?1)", [name])?;
            tx.execute(
                "INSERT OR IGNORE INTO property_amenities (property_id, amenity_id)
                 SELECT ?1, id FROM amenities WHERE name = ?2",
                rusqlite::params![property_id, name],
            )?;
        }

        tx.commit()?;
        Ok(property_id)
    }

    pub fn add_image(&self, property_id: i64, image: &str) -> Result<i64, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO property_images (property_id, image) VALUES (?1, ?2)",
            rusqlite::params![property_id, image],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_amenity(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("INSERT OR IGNORE INTO amenities (name) VALUES (?1)", [name])?;
        Ok(rows > 0)
    }

    /// Insert or update a CBD by name; returns true when it was created
    pub fn upsert_cbd(&self, cbd: &CbdLocation) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE cbd_locations SET city = ?2, latitude = ?3, longitude = ?4, description = ?5, is_active = ?6
             WHERE name = ?1",
            rusqlite::params![cbd.name, cbd.city, cbd.latitude, cbd.longitude, cbd.description, cbd.is_active],
        )?;
        if updated > 0 {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO cbd_locations (name, city, latitude, longitude, description, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![cbd.name, cbd.city, cbd.latitude, cbd.longitude, cbd.description, cbd.is_active],
        )?;
        Ok(true)
    }

    /// Run a single read-only statement, returning column names and JSON rows
    pub fn run_select(&self, sql: &str) -> Result<(Vec<String>, Vec<Map<String, Value>>), StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;

        if !stmt.readonly() {
            return Err(StorageError::Rejected(sql.to_string()));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;

        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut object = Map::new();
            for (idx, name) in columns.iter().enumerate() {
                object.insert(name.clone(), json_value(row.get_ref(idx)?));
            }
            results.push(object);
        }

        Ok((columns, results))
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering
pub(crate) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_select_returns_json_rows() {
        let db = Database::in_memory().unwrap();
        db.add_property(
            &Property::new("Garden cottage", "Avondale", "Harare").with_price(450.0),
            &["WiFi", "Garden"],
        )
        .unwrap();

        let (columns, rows) = db
            .run_select("SELECT id, title, price, suburb FROM properties")
            .unwrap();

        assert_eq!(columns, vec!["id", "title", "price", "suburb"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Garden cottage");
        assert_eq!(rows[0]["price"], 450.0);
    }

    #[test]
    fn test_run_select_rejects_writes() {
        let db = Database::in_memory().unwrap();
        let result = db.run_select("DELETE FROM properties");
        assert!(matches!(result, Err(StorageError::Rejected(_))));
    }

    #[test]
    fn test_upsert_cbd_updates_existing() {
        let db = Database::in_memory().unwrap();
        let mut cbd = CbdLocation {
            id: 0,
            name: "Harare CBD".to_string(),
            city: "Harare".to_string(),
            latitude: -17.8252,
            longitude: 31.0335,
            description: String::new(),
            is_active: true,
        };
        assert!(db.upsert_cbd(&cbd).unwrap());
        cbd.description = "Central Business District of Harare".to_string();
        assert!(!db.upsert_cbd(&cbd).unwrap());
    }

    #[test]
    fn test_encoded_times_sort_chronologically() {
        let early = Utc::now();
        let late = early + chrono::Duration::milliseconds(5);
        assert!(encode_time(&early) < encode_time(&late));
    }
}
