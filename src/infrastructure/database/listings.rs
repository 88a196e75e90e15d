use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, Row};

use super::{time_column, Database};
use crate::application::errors::StorageError;
use crate::domain::entities::{CbdLocation, ListingFilter, ListingStats, ListingType, Property, TypeStats};
use crate::domain::traits::ListingStore;

const EARTH_RADIUS_KM: f64 = 6371.0;
const TOP_CITIES: i64 = 5;

const PROPERTY_COLUMNS: &str = "p.id, p.title, p.description, p.street_address, p.suburb, p.city, \
    p.state_or_region, p.country, p.property_type, p.bedrooms, p.bathrooms, p.area, p.price, \
    p.main_image, p.latitude, p.longitude, p.listing_type, p.is_paid, p.created_at";

/// Great-circle distance between two coordinates
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    let listing_type: String = row.get(16)?;
    Ok(Property {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        street_address: row.get(3)?,
        suburb: row.get(4)?,
        city: row.get(5)?,
        state_or_region: row.get(6)?,
        country: row.get(7)?,
        property_type: row.get(8)?,
        bedrooms: row.get(9)?,
        bathrooms: row.get(10)?,
        area: row.get(11)?,
        price: row.get(12)?,
        main_image: row.get(13)?,
        latitude: row.get(14)?,
        longitude: row.get(15)?,
        listing_type: ListingType::parse(&listing_type),
        is_paid: row.get(17)?,
        created_at: time_column(row, 18)?,
    })
}

fn cbd_from_row(row: &Row<'_>) -> rusqlite::Result<CbdLocation> {
    Ok(CbdLocation {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        description: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn like(term: &str) -> SqlValue {
    SqlValue::Text(format!("%{}%", term.trim()))
}

/// Build the WHERE clause and parameters for a listing filter
fn filter_clause(filter: &ListingFilter) -> (String, Vec<SqlValue>) {
    let mut clauses = vec!["p.is_paid = 1".to_string()];
    let mut params = Vec::new();

    let mut locations = Vec::new();
    for suburb in &filter.suburbs {
        locations.push("p.suburb LIKE ?".to_string());
        params.push(like(suburb));
    }
    for city in &filter.cities {
        locations.push("p.city LIKE ?".to_string());
        params.push(like(city));
    }
    for place in &filter.places {
        locations.push("(p.suburb LIKE ? OR p.city LIKE ?)".to_string());
        params.push(like(place));
        params.push(like(place));
    }
    if !locations.is_empty() {
        clauses.push(format!("({})", locations.join(" OR ")));
    }

    if let Some(property_type) = &filter.property_type {
        clauses.push("LOWER(p.property_type) = LOWER(?)".to_string());
        params.push(SqlValue::Text(property_type.trim().to_string()));
    }

    if let Some(max_price) = filter.max_price {
        clauses.push("p.price <= ?".to_string());
        params.push(SqlValue::Real(max_price));
    }

    for amenity in &filter.amenities {
        clauses.push(
            "EXISTS (SELECT 1 FROM property_amenities pa JOIN amenities a ON a.id = pa.amenity_id
                     WHERE pa.property_id = p.id AND a.name LIKE ?)"
                .to_string(),
        );
        params.push(like(amenity));
    }

    for keyword in &filter.keywords {
        clauses.push("(p.title LIKE ? OR p.description LIKE ?)".to_string());
        params.push(like(keyword));
        params.push(like(keyword));
    }

    (clauses.join(" AND "), params)
}

impl Database {
    fn query_properties(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Property>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), property_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn query_names(&self, sql: &str, param: Option<i64>) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = match param {
            Some(id) => stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?,
            None => stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?,
        };
        Ok(rows)
    }
}

#[async_trait]
impl ListingStore for Database {
    async fn get_property(&self, id: i64) -> Result<Option<Property>, StorageError> {
        let conn = self.lock()?;
        let property = conn
            .query_row(
                &format!("SELECT {} FROM properties p WHERE p.id = ?1", PROPERTY_COLUMNS),
                [id],
                property_from_row,
            )
            .optional()?;
        Ok(property)
    }

    async fn find_property_by_title(&self, title: &str) -> Result<Option<Property>, StorageError> {
        let conn = self.lock()?;
        let property = conn
            .query_row(
                &format!(
                    "SELECT {} FROM properties p WHERE LOWER(p.title) = LOWER(?1) ORDER BY p.id LIMIT 1",
                    PROPERTY_COLUMNS
                ),
                [title.trim()],
                property_from_row,
            )
            .optional()?;
        Ok(property)
    }

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Property>, StorageError> {
        let (clause, mut params) = filter_clause(filter);
        let sql = format!(
            "SELECT {} FROM properties p WHERE {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
            PROPERTY_COLUMNS, clause
        );
        params.push(SqlValue::Integer(filter.limit as i64));

        tracing::debug!(filter = ?filter, "listing search");
        self.query_properties(&sql, params)
    }

    async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<(Property, f64)>, StorageError> {
        let candidates = self.query_properties(
            &format!(
                "SELECT {} FROM properties p
                 WHERE p.is_paid = 1 AND p.latitude IS NOT NULL AND p.longitude IS NOT NULL",
                PROPERTY_COLUMNS
            ),
            Vec::new(),
        )?;

        let mut nearby: Vec<(Property, f64)> = candidates
            .into_iter()
            .filter_map(|p| {
                let (lat, lon) = (p.latitude?, p.longitude?);
                let distance = haversine_km(latitude, longitude, lat, lon);
                (distance <= radius_km).then_some((p, distance))
            })
            .collect();

        nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
        nearby.truncate(limit);
        Ok(nearby)
    }

    async fn featured(&self, limit: usize) -> Result<Vec<Property>, StorageError> {
        self.query_properties(
            &format!(
                "SELECT {} FROM properties p WHERE p.is_paid = 1 AND p.listing_type = 'priority'
                 ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
                PROPERTY_COLUMNS
            ),
            vec![SqlValue::Integer(limit as i64)],
        )
    }

    async fn images_for(&self, property_id: i64) -> Result<Vec<String>, StorageError> {
        self.query_names(
            "SELECT image FROM property_images WHERE property_id = ?1 ORDER BY id",
            Some(property_id),
        )
    }

    async fn amenities_for(&self, property_id: i64) -> Result<Vec<String>, StorageError> {
        self.query_names(
            "SELECT a.name FROM amenities a JOIN property_amenities pa ON pa.amenity_id = a.id
             WHERE pa.property_id = ?1 ORDER BY a.name",
            Some(property_id),
        )
    }

    async fn list_amenities(&self) -> Result<Vec<String>, StorageError> {
        self.query_names("SELECT name FROM amenities ORDER BY name", None)
    }

    async fn cbds_in_city(&self, city: &str) -> Result<Vec<CbdLocation>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, city, latitude, longitude, description, is_active FROM cbd_locations
             WHERE LOWER(city) = LOWER(?1) AND is_active = 1 ORDER BY name",
        )?;
        let rows = stmt.query_map([city.trim()], cbd_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_cbd(&self, id: i64) -> Result<Option<CbdLocation>, StorageError> {
        let conn = self.lock()?;
        let cbd = conn
            .query_row(
                "SELECT id, name, city, latitude, longitude, description, is_active FROM cbd_locations WHERE id = ?1",
                [id],
                cbd_from_row,
            )
            .optional()?;
        Ok(cbd)
    }

    async fn stats(&self) -> Result<ListingStats, StorageError> {
        let conn = self.lock()?;

        let (total, avg_price, min_price, max_price, avg_bedrooms): (i64, Option<f64>, Option<f64>, Option<f64>, Option<f64>) = conn.query_row(
            "SELECT COUNT(*), AVG(price), MIN(price), MAX(price), AVG(bedrooms) FROM properties WHERE is_paid = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT LOWER(property_type), COUNT(*) FROM properties
             WHERE is_paid = 1 AND property_type IS NOT NULL AND property_type != ''
             GROUP BY LOWER(property_type) ORDER BY COUNT(*) DESC, LOWER(property_type)",
        )?;
        let by_type = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

        let mut stmt = conn.prepare(
            "SELECT city, COUNT(*) FROM properties WHERE is_paid = 1 AND city != ''
             GROUP BY city ORDER BY COUNT(*) DESC, city LIMIT ?1",
        )?;
        let top_cities = stmt
            .query_map([TOP_CITIES], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

        Ok(ListingStats {
            total,
            avg_price,
            min_price,
            max_price,
            avg_bedrooms,
            by_type,
            top_cities,
        })
    }

    async fn type_stats(&self, property_type: &str) -> Result<TypeStats, StorageError> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), AVG(price), AVG(bedrooms) FROM properties
             WHERE is_paid = 1 AND LOWER(property_type) = LOWER(?1)",
            [property_type],
            |row| {
                Ok(TypeStats {
                    count: row.get(0)?,
                    avg_price: row.get(1)?,
                    avg_bedrooms: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
