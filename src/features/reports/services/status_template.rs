//! Default history descriptions, used when an admin leaves the description empty.

use std::sync::OnceLock;

use minijinja::{context, Environment};

use crate::core::error::{AppError, Result};
use crate::features::reports::models::ReportStatus;

static TEMPLATES: OnceLock<Environment<'static>> = OnceLock::new();

const STATUS_TEMPLATES: [(&str, &str); 4] = [
    (
        "Diajukan",
        "Pengaduan telah diterima dan terdaftar dalam sistem oleh Pemerintah wilayah {{ region }}",
    ),
    (
        "Diproses",
        "Aduan sedang dalam tahap penanganan oleh tim teknis wilayah {{ region }}",
    ),
    (
        "Selesai",
        "Aduan telah ditanggapi dan diselesaikan oleh tim wilayah {{ region }}",
    ),
    (
        "Ditolak",
        "Aduan tidak dapat diproses karena kekurangan data pendukung",
    ),
];

fn environment() -> &'static Environment<'static> {
    TEMPLATES.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in STATUS_TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!("Failed to load status template {}: {}", name, e);
            }
        }
        env
    })
}

/// Render the default description for `status` in `region`
pub fn render_status_description(status: ReportStatus, region: &str) -> Result<String> {
    let template = environment().get_template(status.as_str()).map_err(|e| {
        AppError::Internal(format!("Missing status template '{}': {}", status, e))
    })?;

    template
        .render(context! { region => region })
        .map_err(|e| AppError::Internal(format!("Failed to render status template: {}", e)))
}
