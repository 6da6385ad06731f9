mod evidence_photo;

pub use evidence_photo::{EvidencePhoto, NewEvidencePhoto};
