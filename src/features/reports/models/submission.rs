use crate::features::evidence::models::EvidencePhoto;
use crate::features::reports::models::{HistoryEntry, Report};

/// File received in a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Citizen submission as received. Coordinates stay raw until validated.
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub title: String,
    pub region: String,
    pub location: String,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
    pub category_id: Option<i64>,
    pub is_anonymous: bool,
    pub photos: Vec<UploadedPhoto>,
}

/// Public identity of a report's author
#[derive(Debug, Clone, PartialEq)]
pub struct Submitter {
    pub name: String,
    pub email: String,
}

/// Report as shown to one viewer, with anonymity already applied
#[derive(Debug, Clone)]
pub struct ReportView {
    pub report: Report,
    pub submitter: Option<Submitter>,
}

#[derive(Debug, Clone)]
pub struct ReportDetail {
    pub view: ReportView,
    pub photos: Vec<EvidencePhoto>,
    pub history: Vec<HistoryEntry>,
}
