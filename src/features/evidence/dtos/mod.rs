mod evidence_dto;

pub use evidence_dto::*;
