use anyhow::Context;
use axum::async_trait;
use time::Date;
use uuid::Uuid;

use super::repo_types::{ManualWastage, Meal, MealPatch, MealType, NewMeal, SlotTiming};
use crate::db::PgStore;

/// Meal catalog. Range queries return meals ordered by date, then slot.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meal>>;
    async fn find_by_slot(&self, date: Date, meal_type: MealType) -> anyhow::Result<Option<Meal>>;
    async fn find_by_date_range(&self, start: Date, end: Date) -> anyhow::Result<Vec<Meal>>;
    /// `None` when the (date, type) slot is already taken.
    async fn create(&self, meal: NewMeal) -> anyhow::Result<Option<Meal>>;
    /// Inserts or replaces menu and timings per slot; manual wastage is kept.
    async fn upsert_many(&self, meals: Vec<NewMeal>) -> anyhow::Result<Vec<Meal>>;
    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<Meal>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Replaces all manual wastage fields. Last writer wins.
    async fn record_wastage(&self, id: Uuid, wastage: ManualWastage)
        -> anyhow::Result<Option<Meal>>;
    async fn latest_timings(&self) -> anyhow::Result<Vec<SlotTiming>>;
}

#[async_trait]
impl MealStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                   actual_wastage, wastage_kg, wastage_remarks, prepared_count
              FROM meals
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find meal by id")?;
        Ok(meal)
    }

    async fn find_by_slot(&self, date: Date, meal_type: MealType) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                   actual_wastage, wastage_kg, wastage_remarks, prepared_count
              FROM meals
             WHERE date = $1 AND type = $2
            "#,
        )
        .bind(date)
        .bind(meal_type)
        .fetch_optional(&self.pool)
        .await
        .context("find meal by slot")?;
        Ok(meal)
    }

    async fn find_by_date_range(&self, start: Date, end: Date) -> anyhow::Result<Vec<Meal>> {
        // meal_type enum order is breakfast, lunch, dinner
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                   actual_wastage, wastage_kg, wastage_remarks, prepared_count
              FROM meals
             WHERE date BETWEEN $1 AND $2
             ORDER BY date, type
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("find meals by date range")?;
        Ok(rows)
    }

    async fn create(&self, meal: NewMeal) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (date, type, menu_items, is_green_day, meal_time, cancel_cutoff)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (date, type) DO NOTHING
            RETURNING id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                      actual_wastage, wastage_kg, wastage_remarks, prepared_count
            "#,
        )
        .bind(meal.date)
        .bind(meal.meal_type)
        .bind(&meal.menu_items)
        .bind(meal.is_green_day)
        .bind(meal.meal_time)
        .bind(meal.cancel_cutoff)
        .fetch_optional(&self.pool)
        .await
        .context("insert meal")?;
        Ok(row)
    }

    async fn upsert_many(&self, meals: Vec<NewMeal>) -> anyhow::Result<Vec<Meal>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let mut out = Vec::with_capacity(meals.len());
        for meal in meals {
            let row = sqlx::query_as::<_, Meal>(
                r#"
                INSERT INTO meals (date, type, menu_items, is_green_day, meal_time, cancel_cutoff)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (date, type) DO UPDATE
                   SET menu_items = EXCLUDED.menu_items,
                       is_green_day = EXCLUDED.is_green_day,
                       meal_time = EXCLUDED.meal_time,
                       cancel_cutoff = EXCLUDED.cancel_cutoff,
                       updated_at = now()
                RETURNING id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                          actual_wastage, wastage_kg, wastage_remarks, prepared_count
                "#,
            )
            .bind(meal.date)
            .bind(meal.meal_type)
            .bind(&meal.menu_items)
            .bind(meal.is_green_day)
            .bind(meal.meal_time)
            .bind(meal.cancel_cutoff)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("upsert meal {} {}", meal.date, meal.meal_type))?;
            out.push(row);
        }
        tx.commit().await.context("commit tx")?;
        Ok(out)
    }

    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<Meal>> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }
        let row = sqlx::query_as::<_, Meal>(
            r#"
            UPDATE meals
               SET menu_items = COALESCE($1, menu_items),
                   is_green_day = COALESCE($2, is_green_day),
                   meal_time = COALESCE($3, meal_time),
                   cancel_cutoff = COALESCE($4, cancel_cutoff),
                   updated_at = now()
             WHERE id = $5
            RETURNING id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                      actual_wastage, wastage_kg, wastage_remarks, prepared_count
            "#,
        )
        .bind(patch.menu_items)
        .bind(patch.is_green_day)
        .bind(patch.meal_time)
        .bind(patch.cancel_cutoff)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("update meal")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM meals WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete meal")?;
        Ok(res.rows_affected() > 0)
    }

    async fn record_wastage(
        &self,
        id: Uuid,
        wastage: ManualWastage,
    ) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            UPDATE meals
               SET actual_wastage = $1,
                   wastage_kg = $2,
                   wastage_remarks = $3,
                   prepared_count = $4,
                   updated_at = now()
             WHERE id = $5
            RETURNING id, date, type AS meal_type, menu_items, is_green_day, meal_time, cancel_cutoff,
                      actual_wastage, wastage_kg, wastage_remarks, prepared_count
            "#,
        )
        .bind(wastage.actual_wastage)
        .bind(wastage.wastage_kg)
        .bind(wastage.remarks)
        .bind(wastage.prepared_count)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("record meal wastage")?;
        Ok(row)
    }

    async fn latest_timings(&self) -> anyhow::Result<Vec<SlotTiming>> {
        let rows = sqlx::query_as::<_, SlotTiming>(
            r#"
            SELECT DISTINCT ON (type) type AS meal_type, meal_time, cancel_cutoff
              FROM meals
             ORDER BY type, date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("latest meal timings")?;
        Ok(rows)
    }
}
