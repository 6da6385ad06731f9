mod engagement_dto;

pub use engagement_dto::*;
