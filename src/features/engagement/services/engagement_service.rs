use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::access::ScopeResolver;
use crate::features::auth::model::Principal;
use crate::features::engagement::models::{CommentView, FollowUp, NewComment, NewFollowUp};
use crate::features::evidence::models::NewEvidencePhoto;
use crate::features::reports::models::{Report, UploadedPhoto};
use crate::modules::storage::{evidence_path, FileStore};
use crate::modules::store::{EngagementStore, ReportStore, UserStore};

/// Comments from any signed-in user and follow-ups from admins
pub struct EngagementService {
    engagement: Arc<dyn EngagementStore>,
    reports: Arc<dyn ReportStore>,
    users: Arc<dyn UserStore>,
    files: Arc<dyn FileStore>,
    scopes: Arc<ScopeResolver>,
}

impl EngagementService {
    pub fn new<S>(store: Arc<S>, files: Arc<dyn FileStore>, scopes: Arc<ScopeResolver>) -> Self
    where
        S: EngagementStore + ReportStore + UserStore + 'static,
    {
        Self {
            engagement: store.clone(),
            reports: store.clone(),
            users: store,
            files,
            scopes,
        }
    }

    pub async fn add_comment(
        &self,
        principal: &Principal,
        report_id: i64,
        text: &str,
    ) -> Result<CommentView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }
        self.find_report(report_id).await?;

        let comment = self
            .engagement
            .insert_comment(NewComment {
                report_id,
                user_id: principal.user_id,
                text: text.to_string(),
            })
            .await?;
        info!("User {} commented on report {}", principal.user_id, report_id);

        let author_name = self.author_name(comment.user_id).await?;
        Ok(CommentView {
            comment,
            author_name,
        })
    }

    /// Newest first
    pub async fn list_comments(&self, report_id: i64) -> Result<Vec<CommentView>> {
        self.find_report(report_id).await?;

        let comments = self.engagement.list_comments(report_id).await?;
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            let author_name = self.author_name(comment.user_id).await?;
            views.push(CommentView {
                comment,
                author_name,
            });
        }
        Ok(views)
    }

    /// Record a follow-up on a report in the admin's scope.
    ///
    /// An attached photo is stored first and then recorded as an extra
    /// evidence photo in the same unit of work as the follow-up.
    pub async fn add_follow_up(
        &self,
        principal: &Principal,
        report_id: i64,
        description: &str,
        photo: Option<UploadedPhoto>,
    ) -> Result<FollowUp> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Follow-up description is required".to_string(),
            ));
        }

        let report = self.find_report(report_id).await?;
        self.scopes.authorize_report(principal, &report).await?;

        let photo_path = match photo {
            Some(photo) => {
                let key = evidence_path(Utc::now(), &photo.file_name);
                Some(self.files.put(&key, photo.data, &photo.content_type).await?)
            }
            None => None,
        };

        let mut uow = self.reports.begin().await?;
        if let Some(path) = &photo_path {
            uow.insert_photo(NewEvidencePhoto {
                report_id,
                path: path.clone(),
            })
            .await?;
        }
        let follow_up = uow
            .insert_follow_up(NewFollowUp {
                report_id,
                admin_id: principal.user_id,
                description: description.to_string(),
                photo_path,
            })
            .await?;
        uow.commit().await?;

        info!(
            "Admin {} added follow-up {} to report {}",
            principal.user_id, follow_up.id, report_id
        );
        Ok(follow_up)
    }

    /// Newest first
    pub async fn list_follow_ups(&self, report_id: i64) -> Result<Vec<FollowUp>> {
        self.find_report(report_id).await?;
        self.engagement.list_follow_ups(report_id).await
    }

    async fn find_report(&self, report_id: i64) -> Result<Report> {
        self.reports
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }

    async fn author_name(&self, user_id: i64) -> Result<String> {
        Ok(self
            .users
            .find_user(user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::EmptyScopePolicy;
    use crate::features::auth::model::Role;
    use crate::features::categories::models::CategoryInput;
    use crate::modules::storage::LocalFileStore;
    use crate::modules::store::{CategoryStore, EvidenceStore, MemoryStore, UnitOfWork};
    use crate::shared::soft_delete::ListMode;
    use crate::shared::test_helpers::{new_report, principal, seed_user};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: EngagementService,
        report_id: i64,
        citizen: Principal,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let citizen = seed_user(&store, Role::Citizen).await;

        let mut uow = store.begin().await.unwrap();
        let report = uow
            .insert_report(new_report(citizen.id, "YK2401015555"))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let root = std::env::temp_dir().join(format!("pengaduan-eng-{}", uuid::Uuid::new_v4()));
        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        let service =
            EngagementService::new(store.clone(), Arc::new(LocalFileStore::new(root)), scopes);
        Fixture {
            store,
            service,
            report_id: report.id,
            citizen: principal(citizen.id, Role::Citizen),
        }
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let f = fixture().await;
        let result = f.service.add_comment(&f.citizen, f.report_id, "   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comments_are_listed_newest_first() {
        let f = fixture().await;
        f.service
            .add_comment(&f.citizen, f.report_id, "Pertama")
            .await
            .unwrap();
        f.service
            .add_comment(&f.citizen, f.report_id, " Kedua ")
            .await
            .unwrap();

        let comments = f.service.list_comments(f.report_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.text, "Kedua");
        assert!(!comments[0].author_name.is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_missing_report() {
        let f = fixture().await;
        let result = f.service.add_comment(&f.citizen, 999, "Halo").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_up_photo_becomes_evidence() {
        let f = fixture().await;
        let admin = seed_user(&f.store, Role::Admin).await;

        let follow_up = f
            .service
            .add_follow_up(
                &principal(admin.id, Role::Admin),
                f.report_id,
                "Sudah ditambal",
                Some(UploadedPhoto {
                    file_name: "tambal.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    data: vec![0xFF, 0xD8],
                }),
            )
            .await
            .unwrap();
        assert!(follow_up.photo_path.is_some());

        let photos = f
            .store
            .list_report_photos(f.report_id, ListMode::Active)
            .await
            .unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(Some(photos[0].path.clone()), follow_up.photo_path);

        let listed = f.service.list_follow_ups(f.report_id).await.unwrap();
        assert_eq!(listed, vec![follow_up]);
    }

    #[tokio::test]
    async fn test_follow_up_requires_scope() {
        let f = fixture().await;
        let result = f
            .service
            .add_follow_up(&f.citizen, f.report_id, "Catatan", None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        // Uncategorised reports are outside every category scope
        let scoped = seed_user(&f.store, Role::CategoryAdmin).await;
        f.store
            .insert_category(CategoryInput {
                name: "Air".to_string(),
                user_id: Some(scoped.id),
            })
            .await
            .unwrap();
        let result = f
            .service
            .add_follow_up(
                &principal(scoped.id, Role::CategoryAdmin),
                f.report_id,
                "Catatan",
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_blank_follow_up_is_rejected() {
        let f = fixture().await;
        let result = f
            .service
            .add_follow_up(&principal(1, Role::Superadmin), f.report_id, "", None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
