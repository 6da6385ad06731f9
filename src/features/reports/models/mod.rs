mod history;
mod report;
mod submission;

pub use history::{HistoryEntry, NewHistoryEntry};
pub use report::{NewReport, Report, ReportChanges, ReportStatus};
pub use submission::{ReportDetail, ReportSubmission, ReportView, Submitter, UploadedPhoto};
