use std::sync::Arc;

use crate::core::error::Result;
use crate::features::access::ScopeResolver;
use crate::features::auth::model::Principal;
use crate::features::dashboard::dtos::{
    DashboardStatsDto, RoleTotalDto, StatusCountDto, TrendsDto,
};
use crate::features::dashboard::models::{CategoryCount, TrendPeriod, TrendSource};
use crate::features::reports::models::ReportStatus;
use crate::modules::store::{StatsStore, UserStore};
use crate::shared::constants::TREND_BUCKETS;

/// Scoped statistics for the admin dashboard
pub struct DashboardService {
    stats: Arc<dyn StatsStore>,
    users: Arc<dyn UserStore>,
    scopes: Arc<ScopeResolver>,
}

impl DashboardService {
    pub fn new<S>(store: Arc<S>, scopes: Arc<ScopeResolver>) -> Self
    where
        S: StatsStore + UserStore + 'static,
    {
        Self {
            stats: store.clone(),
            users: store,
            scopes,
        }
    }

    pub async fn stats(&self, principal: &Principal) -> Result<DashboardStatsDto> {
        let scope = self.scopes.admin_scope(principal).await?;

        let counts = self.stats.status_counts(&scope).await?;
        let by_status: Vec<StatusCountDto> = ReportStatus::ALL
            .into_iter()
            .map(|status| StatusCountDto {
                status,
                total: counts
                    .iter()
                    .find(|(s, _)| *s == status)
                    .map_or(0, |(_, total)| *total),
            })
            .collect();
        let total_reports: i64 = by_status.iter().map(|c| c.total).sum();

        let mut users_by_role: Vec<RoleTotalDto> = self
            .users
            .role_counts()
            .await?
            .into_iter()
            .map(|(role, total)| RoleTotalDto { role, total })
            .collect();
        users_by_role.sort_by_key(|c| c.role.as_str());

        Ok(DashboardStatsDto {
            total_reports,
            by_status,
            users_by_role,
            total_comments: self.stats.comment_count(&scope).await?,
            total_follow_ups: self.stats.follow_up_count(&scope).await?,
        })
    }

    pub async fn trends(&self, principal: &Principal, period: TrendPeriod) -> Result<TrendsDto> {
        let scope = self.scopes.admin_scope(principal).await?;

        Ok(TrendsDto {
            period,
            reports: self
                .stats
                .trend(TrendSource::Reports, period, &scope, TREND_BUCKETS)
                .await?,
            comments: self
                .stats
                .trend(TrendSource::Comments, period, &scope, TREND_BUCKETS)
                .await?,
            follow_ups: self
                .stats
                .trend(TrendSource::FollowUps, period, &scope, TREND_BUCKETS)
                .await?,
        })
    }

    pub async fn by_category(&self, principal: &Principal) -> Result<Vec<CategoryCount>> {
        let scope = self.scopes.admin_scope(principal).await?;
        self.stats.category_counts(&scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::access::EmptyScopePolicy;
    use crate::features::auth::model::Role;
    use crate::features::categories::models::CategoryInput;
    use crate::modules::store::{CategoryStore, MemoryStore, ReportStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user};

    struct Fixture {
        service: DashboardService,
        scoped_admin: Principal,
    }

    /// Three reports: two in "Jalan" (one resolved), one uncategorised
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let citizen = seed_user(&store, Role::Citizen).await;
        let admin = seed_user(&store, Role::CategoryAdmin).await;
        let roads = store
            .insert_category(CategoryInput {
                name: "Jalan".to_string(),
                user_id: Some(admin.id),
            })
            .await
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        for (i, category) in [Some(roads.id), Some(roads.id), None].into_iter().enumerate() {
            let mut new = new_report(citizen.id, &format!("YK240101{}", 7000 + i));
            new.category_id = category;
            let report = uow.insert_report(new).await.unwrap();
            if i == 1 {
                uow.set_status(report.id, ReportStatus::Resolved).await.unwrap();
            }
        }
        uow.commit().await.unwrap();

        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        Fixture {
            service: DashboardService::new(store, scopes),
            scoped_admin: principal(admin.id, Role::CategoryAdmin),
        }
    }

    fn total_for(stats: &DashboardStatsDto, status: ReportStatus) -> i64 {
        stats
            .by_status
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.total)
            .unwrap()
    }

    #[tokio::test]
    async fn test_stats_fill_every_status() {
        let f = fixture().await;
        let stats = f
            .service
            .stats(&principal(1, Role::Superadmin))
            .await
            .unwrap();

        assert_eq!(stats.by_status.len(), 4);
        assert_eq!(stats.total_reports, 3);
        assert_eq!(total_for(&stats, ReportStatus::Submitted), 2);
        assert_eq!(total_for(&stats, ReportStatus::Resolved), 1);
        assert_eq!(total_for(&stats, ReportStatus::Rejected), 0);
    }

    #[tokio::test]
    async fn test_stats_are_scoped() {
        let f = fixture().await;
        let stats = f.service.stats(&f.scoped_admin).await.unwrap();
        assert_eq!(stats.total_reports, 2);

        let by_category = f.service.by_category(&f.scoped_admin).await.unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].total, 2);
    }

    #[tokio::test]
    async fn test_by_category_includes_uncategorised() {
        let f = fixture().await;
        let counts = f
            .service
            .by_category(&principal(1, Role::Superadmin))
            .await
            .unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].category_name.as_deref(), Some("Jalan"));
        assert_eq!(counts[1].category_id, None);
        assert_eq!(counts[1].total, 1);
    }

    #[tokio::test]
    async fn test_trends_group_current_period() {
        let f = fixture().await;
        let trends = f
            .service
            .trends(&principal(1, Role::Superadmin), TrendPeriod::Month)
            .await
            .unwrap();
        assert_eq!(trends.reports.len(), 1);
        assert_eq!(trends.reports[0].total, 3);
        assert!(trends.comments.is_empty());
    }

    #[tokio::test]
    async fn test_citizen_is_rejected() {
        let f = fixture().await;
        let result = f.service.stats(&principal(5, Role::Citizen)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
