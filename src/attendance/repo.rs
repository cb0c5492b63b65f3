use std::collections::HashMap;

use anyhow::Context;
use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{Attendance, MealTally, TallyRow};
use crate::db::PgStore;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Existing row for (user, meal), or a freshly inserted `going` row.
    async fn get_or_create(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Attendance>;
    /// Persists status, guests, skip reason and karma flag of an existing row.
    async fn save(&self, attendance: &Attendance) -> anyhow::Result<Attendance>;
    async fn find_for_user(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Attendance>>;
    /// Going / not-eating counts and guest sums per meal. Meals without
    /// rows are absent from the map.
    async fn tally(&self, meal_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, MealTally>>;
    /// Upserts `not_eating` for every meal; returns rows changed.
    async fn mark_not_eating(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
        skip_reason: &str,
    ) -> anyhow::Result<u64>;
    /// Flips the user's `not_eating` rows back to `going`; returns rows changed.
    async fn restore_going(&self, user_id: Uuid, meal_ids: &[Uuid]) -> anyhow::Result<u64>;
    async fn count_skips(&self, user_id: Uuid) -> anyhow::Result<i64>;
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn get_or_create(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Attendance> {
        sqlx::query(
            r#"
            INSERT INTO attendances (user_id, meal_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, meal_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(meal_id)
        .execute(&self.pool)
        .await
        .context("insert default attendance")?;

        let row = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, user_id, meal_id, status, guest_count, is_karma_claimed, skip_reason
              FROM attendances
             WHERE user_id = $1 AND meal_id = $2
            "#,
        )
        .bind(user_id)
        .bind(meal_id)
        .fetch_one(&self.pool)
        .await
        .context("load attendance")?;
        Ok(row)
    }

    async fn save(&self, attendance: &Attendance) -> anyhow::Result<Attendance> {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendances
               SET status = $1,
                   guest_count = $2,
                   is_karma_claimed = $3,
                   skip_reason = $4,
                   updated_at = now()
             WHERE id = $5
            RETURNING id, user_id, meal_id, status, guest_count, is_karma_claimed, skip_reason
            "#,
        )
        .bind(attendance.status)
        .bind(attendance.guest_count)
        .bind(attendance.is_karma_claimed)
        .bind(&attendance.skip_reason)
        .bind(attendance.id)
        .fetch_one(&self.pool)
        .await
        .context("save attendance")?;
        Ok(row)
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Attendance>> {
        if meal_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, user_id, meal_id, status, guest_count, is_karma_claimed, skip_reason
              FROM attendances
             WHERE user_id = $1 AND meal_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(meal_ids)
        .fetch_all(&self.pool)
        .await
        .context("find attendances for user")?;
        Ok(rows)
    }

    async fn tally(&self, meal_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, MealTally>> {
        if meal_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT meal_id,
                   COUNT(*) FILTER (WHERE status = 'going') AS going,
                   COUNT(*) FILTER (WHERE status = 'not_eating') AS not_eating,
                   COALESCE(SUM(guest_count), 0)::int8 AS guests
              FROM attendances
             WHERE meal_id = ANY($1)
             GROUP BY meal_id
            "#,
        )
        .bind(meal_ids)
        .fetch_all(&self.pool)
        .await
        .context("tally attendances")?;
        Ok(rows
            .into_iter()
            .map(|r| (r.meal_id, MealTally::from(r)))
            .collect())
    }

    async fn mark_not_eating(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
        skip_reason: &str,
    ) -> anyhow::Result<u64> {
        if meal_ids.is_empty() {
            return Ok(0);
        }
        let res = sqlx::query(
            r#"
            INSERT INTO attendances (user_id, meal_id, status, skip_reason)
            SELECT $1::uuid, unnest($2::uuid[]), 'not_eating'::attendance_status, $3::text
            ON CONFLICT (user_id, meal_id)
            DO UPDATE SET status = 'not_eating', skip_reason = $3, updated_at = now()
             WHERE attendances.status <> 'not_eating'
            "#,
        )
        .bind(user_id)
        .bind(meal_ids)
        .bind(skip_reason)
        .execute(&self.pool)
        .await
        .context("bulk mark not eating")?;
        Ok(res.rows_affected())
    }

    async fn restore_going(&self, user_id: Uuid, meal_ids: &[Uuid]) -> anyhow::Result<u64> {
        if meal_ids.is_empty() {
            return Ok(0);
        }
        let res = sqlx::query(
            r#"
            UPDATE attendances
               SET status = 'going', skip_reason = NULL, updated_at = now()
             WHERE user_id = $1 AND meal_id = ANY($2) AND status = 'not_eating'
            "#,
        )
        .bind(user_id)
        .bind(meal_ids)
        .execute(&self.pool)
        .await
        .context("bulk restore going")?;
        Ok(res.rows_affected())
    }

    async fn count_skips(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM attendances WHERE user_id = $1 AND status = 'not_eating'"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("count skipped meals")?;
        Ok(count)
    }
}
