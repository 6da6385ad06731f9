mod engagement_service;

pub use engagement_service::EngagementService;
