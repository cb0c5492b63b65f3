use anyhow::Context;
use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{User, UserRole};
use crate::db::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64>;
    async fn add_karma(&self, user_id: Uuid, points: i32) -> anyhow::Result<()>;
    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM users WHERE role = $1"#)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .context("count users by role")?;
        Ok(count)
    }

    async fn add_karma(&self, user_id: Uuid, points: i32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET karma_points = karma_points + $1,
                   updated_at = now()
             WHERE id = $2
            "#,
        )
        .bind(points)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("add karma")?;
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, role, karma_points FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("find user")?;
        Ok(user)
    }
}
