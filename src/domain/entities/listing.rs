use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Listing tier; priority listings are featured in recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    #[default]
    Normal,
    Priority,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Normal => "normal",
            ListingType::Priority => "priority",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("priority") {
            ListingType::Priority
        } else {
            ListingType::Normal
        }
    }
}

/// A property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub street_address: String,
    pub suburb: String,
    pub city: String,
    pub state_or_region: String,
    pub country: String,
    pub property_type: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    pub main_image: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub listing_type: ListingType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// Minimal paid listing, mostly useful for seeding and tests
    pub fn new(title: impl Into<String>, suburb: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            street_address: String::new(),
            suburb: suburb.into(),
            city: city.into(),
            state_or_region: String::new(),
            country: "Zimbabwe".to_string(),
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            area: None,
            price: None,
            main_image: String::new(),
            latitude: None,
            longitude: None,
            listing_type: ListingType::Normal,
            is_paid: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rooms(mut self, bedrooms: i64, bathrooms: i64) -> Self {
        self.bedrooms = Some(bedrooms);
        self.bathrooms = Some(bathrooms);
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_listing_type(mut self, listing_type: ListingType) -> Self {
        self.listing_type = listing_type;
        self
    }

    pub fn unpaid(mut self) -> Self {
        self.is_paid = false;
        self
    }

    pub fn summary(&self, images: Vec<String>) -> PropertySummary {
        PropertySummary {
            id: Some(self.id),
            title: self.title.clone(),
            description: self.description.clone(),
            street_address: self.street_address.clone(),
            suburb: self.suburb.clone(),
            city: self.city.clone(),
            state_or_region: self.state_or_region.clone(),
            country: self.country.clone(),
            property_type: self.property_type.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            price: self.price,
            main_image: self.main_image.clone(),
            property_images: images,
            distance_from_cbd: None,
            created_at: Some(self.created_at.to_rfc3339()),
        }
    }
}

/// Client-facing listing shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub street_address: String,
    pub suburb: String,
    pub city: String,
    pub state_or_region: String,
    pub country: String,
    pub property_type: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    pub main_image: String,
    pub property_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_cbd: Option<f64>,
    pub created_at: Option<String>,
}

impl PropertySummary {
    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance_from_cbd = Some((km * 10.0).round() / 10.0);
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Central business district reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CbdLocation {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub is_active: bool,
}

/// Filters for listing search; location terms are OR-ed, the rest AND-ed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub suburbs: Vec<String>,
    pub cities: Vec<String>,
    /// Names matched against either suburb or city
    pub places: Vec<String>,
    pub property_type: Option<String>,
    pub max_price: Option<f64>,
    pub amenities: Vec<String>,
    pub keywords: Vec<String>,
    pub limit: usize,
}

impl ListingFilter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn has_location(&self) -> bool {
        !(self.suburbs.is_empty() && self.cities.is_empty() && self.places.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_location()
            && self.property_type.is_none()
            && self.max_price.is_none()
            && self.amenities.is_empty()
            && self.keywords.is_empty()
    }
}

/// Aggregates over paid listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingStats {
    pub total: i64,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_bedrooms: Option<f64>,
    pub by_type: Vec<(String, i64)>,
    pub top_cities: Vec<(String, i64)>,
}

/// Aggregates for a single property type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeStats {
    pub count: i64,
    pub avg_price: Option<f64>,
    pub avg_bedrooms: Option<f64>,
}
