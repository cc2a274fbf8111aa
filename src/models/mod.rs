// Models module - entities and the DTOs exchanged at the API boundary

pub mod dto;
pub mod mapping;
pub mod villa;
pub mod villa_number;

pub use dto::{
    VillaCreateDto, VillaDto, VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto,
    VillaUpdateDto,
};
pub use villa::Villa;
pub use villa_number::VillaNumber;
