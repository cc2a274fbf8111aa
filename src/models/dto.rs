use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_NAME_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaDto {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub amenity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaCreateDto {
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub rate: f64,
    #[serde(default)]
    pub sqft: i32,
    #[serde(default)]
    pub occupancy: i32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub amenity: String,
}

impl VillaCreateDto {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_rate(self.rate, &mut errors);
        check_non_negative("Sqft", self.sqft, &mut errors);
        check_non_negative("Occupancy", self.occupancy, &mut errors);
        finish(errors)
    }
}

/// Full replacement of a villa's editable fields. Also the document shape
/// JSON Patch requests operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaUpdateDto {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub rate: f64,
    pub sqft: i32,
    pub occupancy: i32,
    pub image_url: String,
    #[serde(default)]
    pub amenity: String,
}

impl VillaUpdateDto {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.id <= 0 {
            errors.push("Id must be greater than zero".to_string());
        }
        check_name(&self.name, &mut errors);
        check_rate(self.rate, &mut errors);
        check_non_negative("Sqft", self.sqft, &mut errors);
        check_non_negative("Occupancy", self.occupancy, &mut errors);
        if self.image_url.trim().is_empty() {
            errors.push("ImageUrl is required".to_string());
        }
        finish(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberDto {
    pub villa_no: i32,
    #[serde(default)]
    pub special_details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberCreateDto {
    pub villa_no: i32,
    #[serde(default)]
    pub special_details: String,
}

impl VillaNumberCreateDto {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_villa_no(self.villa_no, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VillaNumberUpdateDto {
    pub villa_no: i32,
    #[serde(default)]
    pub special_details: String,
}

impl VillaNumberUpdateDto {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_villa_no(self.villa_no, &mut errors);
        finish(errors)
    }
}

fn check_name(name: &str, errors: &mut Vec<String>) {
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(format!(
            "Name must be at most {} characters",
            MAX_NAME_LENGTH
        ));
    }
}

fn check_rate(rate: f64, errors: &mut Vec<String>) {
    if !rate.is_finite() || rate < 0.0 {
        errors.push("Rate must be a non-negative number".to_string());
    }
}

fn check_non_negative(field: &str, value: i32, errors: &mut Vec<String>) {
    if value < 0 {
        errors.push(format!("{} must not be negative", field));
    }
}

fn check_villa_no(villa_no: i32, errors: &mut Vec<String>) {
    if villa_no <= 0 {
        errors.push("VillaNo must be greater than zero".to_string());
    }
}

fn finish(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
