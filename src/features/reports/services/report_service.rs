use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::audit_trail::AuditTrail;
use super::time_window::TimeWindow;
use super::tracking_id::TrackingIdGenerator;
use crate::core::error::{AppError, Result};
use crate::features::access::{Scope, ScopeResolver};
use crate::features::auth::model::Principal;
use crate::features::evidence::models::NewEvidencePhoto;
use crate::features::reports::models::{
    HistoryEntry, NewReport, Report, ReportChanges, ReportDetail, ReportStatus, ReportSubmission,
    ReportView, Submitter,
};
use crate::modules::storage::{evidence_path, FileStore};
use crate::modules::store::{
    CategoryStore, EvidenceStore, HistoryStore, ReportQuery, ReportStore, UserStore,
};
use crate::shared::constants::{
    ANONYMOUS_NAME, MAX_SUBMISSION_PHOTOS, MIN_SUBMISSION_PHOTOS, PUBLIC_FEED_LIMIT,
};
use crate::shared::soft_delete::ListMode;
use crate::shared::types::Patch;
use crate::shared::validation::TRACKING_ID_REGEX;

/// Report lifecycle: submission, status changes, metadata edits and scoped reads
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    categories: Arc<dyn CategoryStore>,
    users: Arc<dyn UserStore>,
    evidence: Arc<dyn EvidenceStore>,
    files: Arc<dyn FileStore>,
    scopes: Arc<ScopeResolver>,
    audit: AuditTrail,
    tracking_ids: Arc<dyn TrackingIdGenerator>,
    max_attempts: u32,
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation(format!("Invalid {}: '{}'", field, raw)))
}

fn check_patched_coordinate(patch: &Patch<f64>, field: &str) -> Result<()> {
    match patch {
        Patch::Missing => Ok(()),
        Patch::Null => Err(AppError::Validation(format!("{} cannot be cleared", field))),
        Patch::Value(v) if !v.is_finite() => {
            Err(AppError::Validation(format!("Invalid {}", field)))
        }
        Patch::Value(_) => Ok(()),
    }
}

impl ReportService {
    pub fn new<S>(
        store: Arc<S>,
        files: Arc<dyn FileStore>,
        scopes: Arc<ScopeResolver>,
        tracking_ids: Arc<dyn TrackingIdGenerator>,
        max_attempts: u32,
    ) -> Self
    where
        S: ReportStore + HistoryStore + CategoryStore + UserStore + EvidenceStore + 'static,
    {
        Self {
            reports: store.clone(),
            categories: store.clone(),
            users: store.clone(),
            evidence: store.clone(),
            files,
            scopes,
            audit: AuditTrail::new(store),
            tracking_ids,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Submit a new report with its evidence photos.
    ///
    /// The report row, its photos and the initial history entry are written in
    /// one unit of work. Files are uploaded first and are not cleaned up when
    /// the write fails.
    pub async fn create(&self, principal: &Principal, submission: ReportSubmission) -> Result<Report> {
        let latitude = parse_coordinate(&submission.latitude, "latitude")?;
        let longitude = parse_coordinate(&submission.longitude, "longitude")?;

        let photo_count = submission.photos.len();
        if !(MIN_SUBMISSION_PHOTOS..=MAX_SUBMISSION_PHOTOS).contains(&photo_count) {
            return Err(AppError::Validation(format!(
                "A report needs between {} and {} photos, got {}",
                MIN_SUBMISSION_PHOTOS, MAX_SUBMISSION_PHOTOS, photo_count
            )));
        }

        if let Some(category_id) = submission.category_id {
            if self.categories.find_category(category_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Category {} does not exist",
                    category_id
                )));
            }
        }

        let now = Utc::now();
        let mut paths = Vec::with_capacity(photo_count);
        let mut used = HashSet::new();
        for (index, photo) in submission.photos.into_iter().enumerate() {
            let mut key = evidence_path(now, &photo.file_name);
            let mut tag = index + 1;
            while !used.insert(key.clone()) {
                key = evidence_path(now, &format!("{}_{}", tag, photo.file_name));
                tag += 1;
            }
            let stored = self.files.put(&key, photo.data, &photo.content_type).await?;
            paths.push(stored);
        }

        for attempt in 1..=self.max_attempts {
            let tracking_id = self.tracking_ids.generate(now);
            let mut uow = self.reports.begin().await?;

            let inserted = uow
                .insert_report(NewReport {
                    tracking_id,
                    title: submission.title.clone(),
                    region: submission.region.clone(),
                    location: submission.location.clone(),
                    description: submission.description.clone(),
                    latitude,
                    longitude,
                    user_id: principal.user_id,
                    category_id: submission.category_id,
                    is_anonymous: submission.is_anonymous,
                })
                .await;

            let report = match inserted {
                Ok(report) => report,
                Err(AppError::TrackingIdTaken(taken)) => {
                    warn!(
                        "Tracking id {} already taken (attempt {}/{})",
                        taken, attempt, self.max_attempts
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            for path in &paths {
                uow.insert_photo(NewEvidencePhoto {
                    report_id: report.id,
                    path: path.clone(),
                })
                .await?;
            }

            self.audit
                .append(uow.as_mut(), &report, ReportStatus::Submitted, None, now)
                .await?;
            uow.commit().await?;

            info!(
                "Report {} ({}) submitted by user {} with {} photos",
                report.id,
                report.tracking_id,
                principal.user_id,
                paths.len()
            );
            return Ok(report);
        }

        Err(AppError::Conflict(
            "Could not allocate a unique tracking id, please retry".to_string(),
        ))
    }

    /// Move a report to `status` and record it in the audit trail.
    ///
    /// Any status may follow any other status.
    pub async fn update_status(
        &self,
        principal: &Principal,
        report_id: i64,
        status: ReportStatus,
        description: Option<&str>,
    ) -> Result<Report> {
        let report = self.find(report_id).await?;
        self.scopes.authorize_report(principal, &report).await?;

        let mut uow = self.reports.begin().await?;
        let updated = uow.set_status(report_id, status).await?;
        self.audit
            .append(uow.as_mut(), &updated, status, description, Utc::now())
            .await?;
        uow.commit().await?;

        info!(
            "Report {} moved from {} to {} by user {}",
            report_id, report.status, status, principal.user_id
        );
        Ok(updated)
    }

    /// Edit report fields. Missing fields stay as they are.
    pub async fn update_metadata(
        &self,
        principal: &Principal,
        report_id: i64,
        changes: ReportChanges,
    ) -> Result<Report> {
        check_patched_coordinate(&changes.latitude, "latitude")?;
        check_patched_coordinate(&changes.longitude, "longitude")?;

        let report = self.find(report_id).await?;
        let scope = self.scopes.authorize_report(principal, &report).await?;

        let target_category = match changes.category_id {
            Patch::Missing => None,
            Patch::Null => Some(None),
            Patch::Value(id) => Some(Some(id)),
        };
        if let Some(category_id) = target_category {
            if !scope.permits_category(category_id) {
                return Err(AppError::Forbidden(
                    "Cannot move a report outside your categories".to_string(),
                ));
            }
            if let Some(id) = category_id {
                if self.categories.find_category(id).await?.is_none() {
                    return Err(AppError::Validation(format!("Category {} does not exist", id)));
                }
            }
        }

        if changes.is_empty() {
            return Ok(report);
        }

        let updated = self.reports.update_metadata(report_id, &changes).await?;
        info!("Report {} metadata updated by user {}", report_id, principal.user_id);
        Ok(updated)
    }

    /// Reports visible to `principal`, newest first, optionally limited to a time window
    pub async fn list_filtered(
        &self,
        principal: &Principal,
        filter: Option<&str>,
        month: Option<&str>,
    ) -> Result<Vec<ReportView>> {
        let window = TimeWindow::parse(filter, month)?;
        let scope = self.scopes.compute_scope(principal).await?;

        let mut query = ReportQuery::scoped(scope);
        if let Some(window) = window {
            let (from, before) = window.bounds(Utc::now());
            query.created_from = Some(from);
            query.created_before = before;
        }

        let reports = self.reports.list_reports(&query).await?;
        self.views(reports, Some(principal)).await
    }

    pub async fn list_mine(&self, principal: &Principal) -> Result<Vec<ReportView>> {
        let query = ReportQuery::scoped(Scope::Author(principal.user_id));
        let reports = self.reports.list_reports(&query).await?;
        self.views(reports, Some(principal)).await
    }

    /// Latest reports for the public landing page
    pub async fn latest_public(&self) -> Result<Vec<ReportView>> {
        let mut query = ReportQuery::scoped(Scope::Unrestricted);
        query.limit = Some(PUBLIC_FEED_LIMIT);
        let reports = self.reports.list_reports(&query).await?;
        self.views(reports, None).await
    }

    /// Report detail for its author or an admin whose scope covers it
    pub async fn get_by_id(&self, principal: &Principal, report_id: i64) -> Result<ReportDetail> {
        let report = self.find(report_id).await?;
        if report.user_id != principal.user_id {
            self.scopes.authorize_report(principal, &report).await?;
        }
        self.detail(report, Some(principal), ListMode::Active).await
    }

    /// Public lookup by tracking id
    pub async fn get_by_tracking_id(&self, tracking_id: &str) -> Result<ReportDetail> {
        let tracking_id = tracking_id.trim();
        if tracking_id.is_empty() {
            return Err(AppError::Validation("Tracking ID must not be empty".to_string()));
        }
        if !TRACKING_ID_REGEX.is_match(tracking_id) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid tracking ID",
                tracking_id
            )));
        }

        let report = self
            .reports
            .find_report_by_tracking_id(tracking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No report with tracking ID {}", tracking_id))
            })?;
        self.detail(report, None, ListMode::Active).await
    }

    pub async fn get_public(&self, report_id: i64) -> Result<ReportDetail> {
        let report = self.find(report_id).await?;
        self.detail(report, None, ListMode::Active).await
    }

    /// Detail including soft-deleted photos, for admins
    pub async fn get_with_all_photos(
        &self,
        principal: &Principal,
        report_id: i64,
    ) -> Result<ReportDetail> {
        let report = self.find(report_id).await?;
        self.scopes.authorize_report(principal, &report).await?;
        self.detail(report, Some(principal), ListMode::IncludeDeleted)
            .await
    }

    pub async fn history(&self, principal: &Principal, report_id: i64) -> Result<Vec<HistoryEntry>> {
        let report = self.find(report_id).await?;
        if report.user_id != principal.user_id {
            self.scopes.authorize_report(principal, &report).await?;
        }
        self.audit.list(report_id).await
    }

    async fn find(&self, report_id: i64) -> Result<Report> {
        self.reports
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }

    async fn detail(
        &self,
        report: Report,
        viewer: Option<&Principal>,
        photos: ListMode,
    ) -> Result<ReportDetail> {
        let photos = self.evidence.list_report_photos(report.id, photos).await?;
        let history = self.audit.list(report.id).await?;
        let mut views = self.views(vec![report], viewer).await?;
        let view = views
            .pop()
            .ok_or_else(|| AppError::Internal("Report view was not built".to_string()))?;

        Ok(ReportDetail {
            view,
            photos,
            history,
        })
    }

    async fn views(&self, reports: Vec<Report>, viewer: Option<&Principal>) -> Result<Vec<ReportView>> {
        let mut submitters: BTreeMap<i64, Option<Submitter>> = BTreeMap::new();
        for report in &reports {
            if !submitters.contains_key(&report.user_id) {
                let submitter = self.users.find_user(report.user_id).await?.map(|u| Submitter {
                    name: u.name,
                    email: u.email,
                });
                submitters.insert(report.user_id, submitter);
            }
        }

        Ok(reports
            .into_iter()
            .map(|report| {
                let is_owner = viewer.is_some_and(|p| p.user_id == report.user_id);
                let submitter = submitters
                    .get(&report.user_id)
                    .cloned()
                    .flatten()
                    .map(|s| {
                        if report.is_anonymous && !is_owner {
                            Submitter {
                                name: ANONYMOUS_NAME.to_string(),
                                email: String::new(),
                            }
                        } else {
                            s
                        }
                    });
                ReportView { report, submitter }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::DateTime;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    use crate::features::access::EmptyScopePolicy;
    use crate::features::auth::model::Role;
    use crate::features::categories::models::CategoryInput;
    use crate::features::reports::models::UploadedPhoto;
    use crate::features::reports::services::RandomTrackingIdGenerator;
    use crate::modules::storage::FileStore;
    use crate::modules::store::MemoryStore;
    use crate::shared::test_helpers::seed_user;

    #[derive(Default)]
    struct RecordingFileStore {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl FileStore for RecordingFileStore {
        async fn put(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> Result<String> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(key.to_string())
        }
    }

    /// Hands out ids from a fixed list, repeating the last one
    struct FixedTrackingIds {
        ids: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl FixedTrackingIds {
        fn new(ids: Vec<&'static str>) -> Self {
            Self {
                ids,
                next: AtomicUsize::new(0),
            }
        }
    }

    impl TrackingIdGenerator for FixedTrackingIds {
        fn generate(&self, _now: DateTime<Utc>) -> String {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.ids[i.min(self.ids.len() - 1)].to_string()
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        files: Arc<RecordingFileStore>,
        service: ReportService,
    }

    fn fixture_with(policy: EmptyScopePolicy, ids: Arc<dyn TrackingIdGenerator>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(RecordingFileStore::default());
        let scopes = Arc::new(ScopeResolver::new(store.clone(), policy));
        let service = ReportService::new(store.clone(), files.clone(), scopes, ids, 3);
        Fixture {
            store,
            files,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            EmptyScopePolicy::Unrestricted,
            Arc::new(RandomTrackingIdGenerator::new("YK")),
        )
    }

    fn photos(n: usize) -> Vec<UploadedPhoto> {
        (0..n)
            .map(|i| UploadedPhoto {
                file_name: format!("foto{}.jpg", i),
                content_type: "image/jpeg".to_string(),
                data: vec![0xFF, 0xD8, i as u8],
            })
            .collect()
    }

    fn submission(region: &str, photo_count: usize) -> ReportSubmission {
        ReportSubmission {
            title: Sentence(3..6).fake(),
            region: region.to_string(),
            location: "Jl. Malioboro".to_string(),
            description: Sentence(8..12).fake(),
            latitude: "-7.7925".to_string(),
            longitude: "110.3658".to_string(),
            category_id: None,
            is_anonymous: false,
            photos: photos(photo_count),
        }
    }

    async fn citizen(f: &Fixture) -> Principal {
        let user = seed_user(&f.store, Role::Citizen).await;
        Principal {
            user_id: user.id,
            role: user.role,
            category_ids: Vec::new(),
            is_active: true,
        }
    }

    async fn admin(f: &Fixture, role: Role) -> Principal {
        let user = seed_user(&f.store, role).await;
        Principal {
            user_id: user.id,
            role,
            category_ids: Vec::new(),
            is_active: true,
        }
    }

    async fn category(f: &Fixture, name: &str, owner: Option<i64>) -> i64 {
        f.store
            .insert_category(CategoryInput {
                name: name.to_string(),
                user_id: owner,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_submission_with_two_photos_in_north() {
        let f = fixture();
        let owner = citizen(&f).await;

        let report = f
            .service
            .create(&owner, submission("North", 2))
            .await
            .unwrap();
        assert_eq!(report.status, ReportStatus::Submitted);

        let history = f.service.history(&owner, report.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, ReportStatus::Submitted);
        assert!(history[0].description.contains("North"));

        let detail = f.service.get_by_id(&owner, report.id).await.unwrap();
        assert_eq!(detail.photos.len(), 2);
        assert_eq!(f.files.keys.lock().unwrap().len(), 2);
        assert!(detail.photos.iter().all(|p| p.path.starts_with("evidence/")));
    }

    #[tokio::test]
    async fn test_equal_file_names_get_distinct_keys() {
        let f = fixture();
        let owner = citizen(&f).await;

        let mut sub = submission("Sleman", 0);
        sub.photos = ["3_a.jpg", "a.jpg", "a.jpg"]
            .iter()
            .map(|name| UploadedPhoto {
                file_name: name.to_string(),
                content_type: "image/jpeg".to_string(),
                data: vec![0xFF, 0xD8],
            })
            .collect();
        let report = f.service.create(&owner, sub).await.unwrap();

        let keys = f.files.keys.lock().unwrap().clone();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(unique.len(), 3, "keys collided: {:?}", keys);

        let detail = f.service.get_by_id(&owner, report.id).await.unwrap();
        let paths: HashSet<String> = detail.photos.into_iter().map(|p| p.path).collect();
        assert_eq!(paths.len(), 3);
    }

    #[tokio::test]
    async fn test_photo_count_bounds() {
        let f = fixture();
        let owner = citizen(&f).await;

        for count in [0, 4] {
            let result = f.service.create(&owner, submission("Sleman", count)).await;
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "{} photos should be rejected",
                count
            );
        }
        for count in 1..=3 {
            assert!(f.service.create(&owner, submission("Sleman", count)).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_rejects_non_numeric_coordinates() {
        let f = fixture();
        let owner = citizen(&f).await;

        let mut bad = submission("Sleman", 1);
        bad.latitude = "abc".to_string();
        assert!(matches!(
            f.service.create(&owner, bad).await,
            Err(AppError::Validation(_))
        ));

        let mut bad = submission("Sleman", 1);
        bad.longitude = "NaN".to_string();
        assert!(matches!(
            f.service.create(&owner, bad).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_every_status_update_appends_exactly_one_entry() {
        let f = fixture();
        let owner = citizen(&f).await;
        let superadmin = admin(&f, Role::Superadmin).await;
        let report = f
            .service
            .create(&owner, submission("Bantul", 1))
            .await
            .unwrap();

        for (i, status) in ReportStatus::ALL.into_iter().enumerate() {
            let updated = f
                .service
                .update_status(&superadmin, report.id, status, None)
                .await
                .unwrap();
            assert_eq!(updated.status, status);

            let history = f.service.history(&superadmin, report.id).await.unwrap();
            assert_eq!(history.len(), i + 2);
            assert_eq!(history[0].status, status);
        }
    }

    #[tokio::test]
    async fn test_resolved_without_description_uses_template() {
        let f = fixture();
        let owner = citizen(&f).await;
        let superadmin = admin(&f, Role::Superadmin).await;
        let report = f
            .service
            .create(&owner, submission("North", 1))
            .await
            .unwrap();

        f.service
            .update_status(&superadmin, report.id, ReportStatus::Resolved, Some("   "))
            .await
            .unwrap();

        let history = f.service.history(&superadmin, report.id).await.unwrap();
        assert_eq!(
            history[0].description,
            "Aduan telah ditanggapi dan diselesaikan oleh tim wilayah North"
        );
    }

    #[tokio::test]
    async fn test_status_can_move_backwards() {
        let f = fixture();
        let owner = citizen(&f).await;
        let superadmin = admin(&f, Role::Superadmin).await;
        let report = f.service.create(&owner, submission("Kulon Progo", 1)).await.unwrap();

        f.service
            .update_status(&superadmin, report.id, ReportStatus::Resolved, None)
            .await
            .unwrap();
        let reopened = f
            .service
            .update_status(&superadmin, report.id, ReportStatus::Submitted, Some("Dibuka kembali"))
            .await
            .unwrap();
        assert_eq!(reopened.status, ReportStatus::Submitted);
    }

    #[tokio::test]
    async fn test_status_update_outside_scope_is_forbidden() {
        let f = fixture();
        let owner = citizen(&f).await;
        let roads_admin = admin(&f, Role::CategoryAdmin).await;
        let water_admin = admin(&f, Role::CategoryAdmin).await;
        let roads = category(&f, "Jalan", Some(roads_admin.user_id)).await;
        category(&f, "Air", Some(water_admin.user_id)).await;

        let mut s = submission("Sleman", 1);
        s.category_id = Some(roads);
        let report = f.service.create(&owner, s).await.unwrap();

        let result = f
            .service
            .update_status(&water_admin, report.id, ReportStatus::InProgress, None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let history = f.service.history(&roads_admin, report.id).await.unwrap();
        assert_eq!(history.len(), 1);

        f.service
            .update_status(&roads_admin, report.id, ReportStatus::InProgress, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_colliding_tracking_ids_retry_then_conflict() {
        let ids = Arc::new(FixedTrackingIds::new(vec![
            "YK2401011234",
            "YK2401011234",
            "YK2401015678",
        ]));
        let f = fixture_with(EmptyScopePolicy::Unrestricted, ids);
        let owner = citizen(&f).await;

        let first = f.service.create(&owner, submission("A", 1)).await.unwrap();
        assert_eq!(first.tracking_id, "YK2401011234");

        // Second call collides once, then gets a fresh id
        let second = f.service.create(&owner, submission("B", 1)).await.unwrap();
        assert_eq!(second.tracking_id, "YK2401015678");

        // Every further candidate collides until attempts run out
        let third = f.service.create(&owner, submission("C", 1)).await;
        assert!(matches!(third, Err(AppError::Conflict(_))));

        let stored = f
            .service
            .get_by_tracking_id("YK2401011234")
            .await
            .unwrap();
        assert_eq!(stored.view.report.region, "A");
    }

    #[tokio::test]
    async fn test_metadata_patch_semantics() {
        let f = fixture();
        let owner = citizen(&f).await;
        let superadmin = admin(&f, Role::Superadmin).await;
        let report = f.service.create(&owner, submission("Sleman", 1)).await.unwrap();

        let changes = ReportChanges {
            title: Patch::Value("Judul baru".to_string()),
            description: Patch::Null,
            ..Default::default()
        };
        let updated = f
            .service
            .update_metadata(&superadmin, report.id, changes)
            .await
            .unwrap();
        assert_eq!(updated.title, "Judul baru");
        assert_eq!(updated.description, "");
        assert_eq!(updated.region, report.region);
        assert_eq!(updated.latitude, report.latitude);

        let clear_lat = ReportChanges {
            latitude: Patch::Null,
            ..Default::default()
        };
        assert!(matches!(
            f.service.update_metadata(&superadmin, report.id, clear_lat).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_category_admin_cannot_move_report_out_of_scope() {
        let f = fixture();
        let owner = citizen(&f).await;
        let roads_admin = admin(&f, Role::CategoryAdmin).await;
        let roads = category(&f, "Jalan", Some(roads_admin.user_id)).await;
        let water = category(&f, "Air", None).await;

        let mut s = submission("Sleman", 1);
        s.category_id = Some(roads);
        let report = f.service.create(&owner, s).await.unwrap();

        let changes = ReportChanges {
            category_id: Patch::Value(water),
            ..Default::default()
        };
        let result = f
            .service
            .update_metadata(&roads_admin, report.id, changes)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_filtered_listing_is_scoped() {
        let f = fixture();
        let owner = citizen(&f).await;
        let other = citizen(&f).await;
        let roads_admin = admin(&f, Role::Admin).await;
        let roads = category(&f, "Jalan", Some(roads_admin.user_id)).await;

        let mut in_scope = submission("Sleman", 1);
        in_scope.category_id = Some(roads);
        let in_scope = f.service.create(&owner, in_scope).await.unwrap();
        f.service.create(&other, submission("Bantul", 1)).await.unwrap();

        let seen = f
            .service
            .list_filtered(&roads_admin, Some("today"), None)
            .await
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].report.id, in_scope.id);

        let mine = f.service.list_filtered(&other, None, None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].report.user_id, other.user_id);

        let result = f.service.list_filtered(&roads_admin, None, Some("2024/01")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_anonymous_reports_hide_submitter_from_others() {
        let f = fixture();
        let owner = citizen(&f).await;
        let superadmin = admin(&f, Role::Superadmin).await;

        let mut s = submission("Sleman", 1);
        s.is_anonymous = true;
        let report = f.service.create(&owner, s).await.unwrap();

        let public = f.service.get_public(report.id).await.unwrap();
        let submitter = public.view.submitter.unwrap();
        assert_eq!(submitter.name, ANONYMOUS_NAME);
        assert_eq!(submitter.email, "");

        let as_admin = f.service.get_by_id(&superadmin, report.id).await.unwrap();
        assert_eq!(as_admin.view.submitter.unwrap().name, ANONYMOUS_NAME);

        let as_owner = f.service.get_by_id(&owner, report.id).await.unwrap();
        assert_ne!(as_owner.view.submitter.unwrap().name, ANONYMOUS_NAME);
    }

    #[tokio::test]
    async fn test_citizen_cannot_read_someone_elses_report() {
        let f = fixture();
        let owner = citizen(&f).await;
        let stranger = citizen(&f).await;
        let report = f.service.create(&owner, submission("Sleman", 1)).await.unwrap();

        let result = f.service.get_by_id(&stranger, report.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_public_feed_is_capped() {
        let f = fixture();
        let owner = citizen(&f).await;
        for _ in 0..10 {
            f.service.create(&owner, submission("Sleman", 1)).await.unwrap();
        }

        let feed = f.service.latest_public().await.unwrap();
        assert_eq!(feed.len(), PUBLIC_FEED_LIMIT as usize);
        assert!(feed
            .windows(2)
            .all(|w| w[0].report.created_at >= w[1].report.created_at));
    }

    #[tokio::test]
    async fn test_tracking_id_lookup_validates_format() {
        let f = fixture();
        assert!(matches!(
            f.service.get_by_tracking_id("").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.service.get_by_tracking_id("not-an-id").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.service.get_by_tracking_id("YK2401019999").await,
            Err(AppError::NotFound(_))
        ));
    }
}
