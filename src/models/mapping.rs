//! Field-copy conversions between entities and their DTOs.

use chrono::Utc;

use super::dto::{
    VillaCreateDto, VillaDto, VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto,
    VillaUpdateDto,
};
use super::{Villa, VillaNumber};

impl From<Villa> for VillaDto {
    fn from(villa: Villa) -> Self {
        Self {
            id: villa.id,
            name: villa.name,
            details: villa.details,
            rate: villa.rate,
            sqft: villa.sqft,
            occupancy: villa.occupancy,
            image_url: villa.image_url,
            amenity: villa.amenity,
        }
    }
}

impl From<VillaDto> for Villa {
    fn from(dto: VillaDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            details: dto.details,
            rate: dto.rate,
            sqft: dto.sqft,
            occupancy: dto.occupancy,
            image_url: dto.image_url,
            amenity: dto.amenity,
            created_date: Utc::now(),
            updated_date: None,
        }
    }
}

/// New villa stamped with the creation time; the key is assigned on insert.
impl From<VillaCreateDto> for Villa {
    fn from(dto: VillaCreateDto) -> Self {
        Self {
            id: 0,
            name: dto.name,
            details: dto.details,
            rate: dto.rate,
            sqft: dto.sqft,
            occupancy: dto.occupancy,
            image_url: dto.image_url,
            amenity: dto.amenity,
            created_date: Utc::now(),
            updated_date: None,
        }
    }
}

impl From<Villa> for VillaUpdateDto {
    fn from(villa: Villa) -> Self {
        Self {
            id: villa.id,
            name: villa.name,
            details: villa.details,
            rate: villa.rate,
            sqft: villa.sqft,
            occupancy: villa.occupancy,
            image_url: villa.image_url,
            amenity: villa.amenity,
        }
    }
}

impl Villa {
    /// Copies every editable field from `dto`, keeping identity and timestamps.
    pub fn apply(&mut self, dto: VillaUpdateDto) {
        self.name = dto.name;
        self.details = dto.details;
        self.rate = dto.rate;
        self.sqft = dto.sqft;
        self.occupancy = dto.occupancy;
        self.image_url = dto.image_url;
        self.amenity = dto.amenity;
    }
}

impl From<VillaNumber> for VillaNumberDto {
    fn from(villa_number: VillaNumber) -> Self {
        Self {
            villa_no: villa_number.villa_no,
            special_details: villa_number.special_details,
        }
    }
}

impl From<VillaNumberDto> for VillaNumber {
    fn from(dto: VillaNumberDto) -> Self {
        Self {
            villa_no: dto.villa_no,
            special_details: dto.special_details,
            created_date: Utc::now(),
            updated_date: None,
        }
    }
}

impl From<VillaNumberCreateDto> for VillaNumber {
    fn from(dto: VillaNumberCreateDto) -> Self {
        Self {
            villa_no: dto.villa_no,
            special_details: dto.special_details,
            created_date: Utc::now(),
            updated_date: None,
        }
    }
}

impl From<VillaNumber> for VillaNumberUpdateDto {
    fn from(villa_number: VillaNumber) -> Self {
        Self {
            villa_no: villa_number.villa_no,
            special_details: villa_number.special_details,
        }
    }
}

impl VillaNumber {
    pub fn apply(&mut self, dto: VillaNumberUpdateDto) {
        self.special_details = dto.special_details;
    }
}
