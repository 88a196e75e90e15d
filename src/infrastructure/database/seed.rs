//! Reference data: CBD coordinates, the amenity catalogue and demo listings

use super::Database;
use crate::application::errors::StorageError;
use crate::domain::entities::{CbdLocation, ListingType, Property};

/// (city, latitude, longitude)
pub const CBD_SEEDS: &[(&str, f64, f64)] = &[
    ("Harare", -17.8252, 31.0335),
    ("Bulawayo", -20.1325, 28.6264),
    ("Mutare", -18.9726, 32.6706),
    ("Gweru", -19.4500, 29.8167),
    ("Kwekwe", -18.9167, 29.8167),
    ("Masvingo", -20.0667, 30.8333),
    ("Chitungwiza", -18.0000, 31.0500),
    ("Epworth", -17.8833, 31.1500),
    ("Ruwa", -17.8833, 31.2333),
    ("Chegutu", -18.1333, 30.1500),
    ("Kadoma", -18.3333, 29.9167),
    ("Marondera", -18.1833, 31.5500),
];

pub const AMENITIES: &[&str] = &[
    "WiFi",
    "Air Conditioning",
    "Parking",
    "Swimming Pool",
    "Garden",
    "Security",
    "Gym/Fitness Center",
    "Laundry",
    "Furnished",
    "Kitchen",
    "Balcony/Terrace",
    "Pet Friendly",
    "Heating",
    "TV/Cable",
    "Generator/Backup Power",
    "Water Tank",
    "Borehole",
    "Solar Power",
    "Dishwasher",
    "Microwave",
    "Washing Machine",
    "Dryer",
    "Alarm System",
    "CCTV",
    "Electric Fence",
];

/// Counts reported by a seeding run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub cbds_created: usize,
    pub cbds_updated: usize,
    pub amenities_created: usize,
    pub listings_created: usize,
}

impl Database {
    pub fn seed_cbds(&self, report: &mut SeedReport) -> Result<(), StorageError> {
        for &(city, latitude, longitude) in CBD_SEEDS {
            let description = if city == "Harare" {
                "Central Business District of Harare, the capital city".to_string()
            } else {
                format!("Central Business District of {}", city)
            };
            let cbd = CbdLocation {
                id: 0,
                name: format!("{} CBD", city),
                city: city.to_string(),
                latitude,
                longitude,
                description,
                is_active: true,
            };

            if self.upsert_cbd(&cbd)? {
                tracing::info!("Created CBD: {}", cbd.name);
                report.cbds_created += 1;
            } else {
                tracing::debug!("Updated CBD: {}", cbd.name);
                report.cbds_updated += 1;
            }
        }
        Ok(())
    }

    pub fn seed_amenities(&self, report: &mut SeedReport) -> Result<(), StorageError> {
        for name in AMENITIES {
            if self.add_amenity(name)? {
                report.amenities_created += 1;
            }
        }
        Ok(())
    }

    /// A handful of paid listings around Harare and Bulawayo for local testing
    pub fn seed_sample_listings(&self, report: &mut SeedReport) -> Result<(), StorageError> {
        let samples: Vec<(Property, &[&str], &str)> = vec![
            (
                Property::new("Modern two bedroom apartment", "Avondale", "Harare")
                    .with_type("apartment")
                    .with_price(450.0)
                    .with_rooms(2, 1)
                    .with_location(-17.7960, 31.0380)
                    .with_description("Secure apartment close to Avondale shops with fast WiFi and parking"),
                &["WiFi", "Parking", "Security"],
                "properties/avondale_apartment.jpg",
            ),
            (
                Property::new("Family house with pool", "Borrowdale", "Harare")
                    .with_type("house")
                    .with_price(1500.0)
                    .with_rooms(4, 3)
                    .with_location(-17.7700, 31.0800)
                    .with_listing_type(ListingType::Priority)
                    .with_description("Spacious family home with swimming pool, borehole and solar power"),
                &["Swimming Pool", "Borehole", "Solar Power", "Garden"],
                "properties/borrowdale_house.jpg",
            ),
            (
                Property::new("Garden cottage", "Mount Pleasant", "Harare")
                    .with_type("house")
                    .with_price(600.0)
                    .with_rooms(1, 1)
                    .with_location(-17.7700, 31.0500)
                    .with_description("Quiet furnished cottage in a leafy garden near the university"),
                &["Garden", "Furnished", "WiFi"],
                "properties/mount_pleasant_cottage.jpg",
            ),
            (
                Property::new("City centre room", "CBD", "Harare")
                    .with_type("room")
                    .with_price(150.0)
                    .with_rooms(1, 1)
                    .with_location(-17.8290, 31.0450)
                    .with_description("Affordable room walking distance to town and transport"),
                &["WiFi"],
                "properties/harare_room.jpg",
            ),
            (
                Property::new("Suburbs guesthouse", "Suburbs", "Bulawayo")
                    .with_type("guesthouse")
                    .with_price(80.0)
                    .with_rooms(6, 6)
                    .with_location(-20.1400, 28.6000)
                    .with_listing_type(ListingType::Priority)
                    .with_description("Guesthouse with breakfast, secure parking and DSTV"),
                &["Parking", "TV/Cable", "Security"],
                "properties/bulawayo_guesthouse.jpg",
            ),
        ];

        for (property, amenities, image) in samples {
            let id = self.add_property(&property, amenities)?;
            self.add_image(id, image)?;
            report.listings_created += 1;
        }
        Ok(())
    }
}
