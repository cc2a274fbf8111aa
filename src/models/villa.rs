use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::repository::{Entity, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Villa {
    pub id: i32,
    pub name: String,
    pub details: String,
    pub rate: f64,
    pub sqft: i32,
    pub occupancy: i32,
    pub image_url: String,
    pub amenity: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl Villa {
    pub const ID: &'static str = "id";
    pub const NAME: &'static str = "name";
    pub const DETAILS: &'static str = "details";
    pub const RATE: &'static str = "rate";
    pub const SQFT: &'static str = "sqft";
    pub const OCCUPANCY: &'static str = "occupancy";
    pub const IMAGE_URL: &'static str = "image_url";
    pub const AMENITY: &'static str = "amenity";
    pub const CREATED_DATE: &'static str = "created_date";
    pub const UPDATED_DATE: &'static str = "updated_date";
}

impl Entity for Villa {
    const TABLE: &'static str = "villas";
    const KEY: &'static str = Self::ID;
    const GENERATED_KEY: bool = true;

    fn key(&self) -> i32 {
        self.id
    }

    fn set_key(&mut self, key: i32) {
        self.id = key;
    }

    fn unique_value(&self) -> Option<String> {
        Some(self.name.to_lowercase())
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            (Self::ID, self.id.into()),
            (Self::NAME, self.name.clone().into()),
            (Self::DETAILS, self.details.clone().into()),
            (Self::RATE, self.rate.into()),
            (Self::SQFT, self.sqft.into()),
            (Self::OCCUPANCY, self.occupancy.into()),
            (Self::IMAGE_URL, self.image_url.clone().into()),
            (Self::AMENITY, self.amenity.clone().into()),
            (Self::CREATED_DATE, self.created_date.into()),
            (Self::UPDATED_DATE, self.updated_date.into()),
        ]
    }
}
