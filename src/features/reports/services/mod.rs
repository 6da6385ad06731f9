mod audit_trail;
mod report_service;
mod status_template;
mod time_window;
mod tracking_id;

pub use audit_trail::AuditTrail;
pub use report_service::ReportService;
pub use status_template::render_status_description;
pub use time_window::TimeWindow;
pub use tracking_id::{RandomTrackingIdGenerator, TrackingIdGenerator};
