use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::repository::{Entity, Value};

/// A numbered unit. `villa_no` is chosen by the client, not generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumber {
    pub villa_no: i32,
    pub special_details: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl VillaNumber {
    pub const VILLA_NO: &'static str = "villa_no";
    pub const SPECIAL_DETAILS: &'static str = "special_details";
    pub const CREATED_DATE: &'static str = "created_date";
    pub const UPDATED_DATE: &'static str = "updated_date";
}

impl Entity for VillaNumber {
    const TABLE: &'static str = "villa_numbers";
    const KEY: &'static str = Self::VILLA_NO;
    const GENERATED_KEY: bool = false;

    fn key(&self) -> i32 {
        self.villa_no
    }

    fn set_key(&mut self, key: i32) {
        self.villa_no = key;
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            (Self::VILLA_NO, self.villa_no.into()),
            (Self::SPECIAL_DETAILS, self.special_details.clone().into()),
            (Self::CREATED_DATE, self.created_date.into()),
            (Self::UPDATED_DATE, self.updated_date.into()),
        ]
    }
}
