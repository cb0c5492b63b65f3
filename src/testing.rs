//! In-memory stores and request helpers for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use axum::{
    async_trait,
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use time::{Date, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use crate::attendance::repo::AttendanceStore;
use crate::attendance::repo_types::{Attendance, AttendanceStatus, MealTally};
use crate::auth::claims::{Claims, TokenKind};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{User, UserRole};
use crate::config::{AnalyticsConfig, AppConfig, JwtConfig};
use crate::meals::repo::MealStore;
use crate::meals::repo_types::{ManualWastage, Meal, MealPatch, MealType, NewMeal, SlotTiming};
use crate::state::AppState;

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "messwise".into(),
            audience: "messwise-users".into(),
        },
        analytics: AnalyticsConfig::default(),
    }
}

pub fn test_state() -> AppState {
    MemoryStore::new().state()
}

pub fn mint_token(state: &AppState, user_id: Uuid, role: UserRole, kind: TokenKind) -> String {
    let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + 900,
        iss: state.config.jwt.issuer.clone(),
        aud: state.config.jwt.audience.clone(),
        kind,
        role,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
    )
    .expect("encode test token")
}

/// Meal in `meal_type`'s default slot with no wastage recorded.
pub fn meal_on(date: Date, meal_type: MealType) -> Meal {
    materialize(NewMeal {
        date,
        meal_type,
        menu_items: "Standard Menu".into(),
        is_green_day: false,
        meal_time: meal_type.default_meal_time(),
        cancel_cutoff: meal_type.default_cancel_cutoff(),
    })
}

fn materialize(m: NewMeal) -> Meal {
    Meal {
        id: Uuid::new_v4(),
        date: m.date,
        meal_type: m.meal_type,
        menu_items: m.menu_items,
        is_green_day: m.is_green_day,
        meal_time: m.meal_time,
        cancel_cutoff: m.cancel_cutoff,
        wastage: ManualWastage::default(),
    }
}

#[derive(Default)]
struct Data {
    meals: Vec<Meal>,
    attendances: Vec<Attendance>,
    users: Vec<User>,
}

/// Backs all three store traits with plain vectors, mirroring the
/// Postgres semantics the handlers rely on.
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<Data>>,
    config: Arc<AppConfig>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::default(),
            config: Arc::new(test_config()),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::from_parts(self.config.clone(), Arc::new(self.clone()))
    }

    pub fn app(&self) -> Router {
        crate::app::build_app(self.state())
    }

    pub fn add_meal(&self, date: Date, meal_type: MealType) -> Meal {
        let meal = meal_on(date, meal_type);
        self.data.lock().unwrap().meals.push(meal.clone());
        meal
    }

    pub fn add_user(&self, role: UserRole) -> Uuid {
        let mut data = self.data.lock().unwrap();
        let id = Uuid::new_v4();
        let n = data.users.len() + 1;
        data.users.push(User {
            id,
            name: format!("User {n}"),
            email: format!("user{n}@mess.test"),
            role,
            karma_points: 0,
        });
        id
    }

    pub fn add_student(&self) -> Uuid {
        self.add_user(UserRole::Student)
    }

    pub fn student_ids(&self) -> Vec<Uuid> {
        self.data
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role == UserRole::Student)
            .map(|u| u.id)
            .collect()
    }

    pub fn add_attendance(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        status: AttendanceStatus,
        guest_count: i32,
    ) {
        let mut row = Attendance::fresh(user_id, meal_id);
        row.status = status;
        row.guest_count = guest_count;
        self.data.lock().unwrap().attendances.push(row);
    }

    /// Access token for a freshly registered user of `role`.
    pub fn token(&self, role: UserRole) -> String {
        let id = self.add_user(role);
        self.token_for(id, role)
    }

    pub fn token_for(&self, user_id: Uuid, role: UserRole) -> String {
        mint_token(&self.state(), user_id, role, TokenKind::Access)
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let data = self.data.lock().unwrap();
        Ok(data.meals.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_slot(&self, date: Date, meal_type: MealType) -> anyhow::Result<Option<Meal>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .meals
            .iter()
            .find(|m| m.date == date && m.meal_type == meal_type)
            .cloned())
    }

    async fn find_by_date_range(&self, start: Date, end: Date) -> anyhow::Result<Vec<Meal>> {
        let data = self.data.lock().unwrap();
        let mut out: Vec<Meal> = data
            .meals
            .iter()
            .filter(|m| m.date >= start && m.date <= end)
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.date, m.meal_type));
        Ok(out)
    }

    async fn create(&self, meal: NewMeal) -> anyhow::Result<Option<Meal>> {
        let mut data = self.data.lock().unwrap();
        if data
            .meals
            .iter()
            .any(|m| m.date == meal.date && m.meal_type == meal.meal_type)
        {
            return Ok(None);
        }
        let meal = materialize(meal);
        data.meals.push(meal.clone());
        Ok(Some(meal))
    }

    async fn upsert_many(&self, meals: Vec<NewMeal>) -> anyhow::Result<Vec<Meal>> {
        let mut data = self.data.lock().unwrap();
        let mut out = Vec::with_capacity(meals.len());
        for new in meals {
            let existing = data
                .meals
                .iter_mut()
                .find(|m| m.date == new.date && m.meal_type == new.meal_type);
            match existing {
                Some(m) => {
                    m.menu_items = new.menu_items;
                    m.is_green_day = new.is_green_day;
                    m.meal_time = new.meal_time;
                    m.cancel_cutoff = new.cancel_cutoff;
                    out.push(m.clone());
                }
                None => {
                    let m = materialize(new);
                    data.meals.push(m.clone());
                    out.push(m);
                }
            }
        }
        Ok(out)
    }

    async fn update(&self, id: Uuid, patch: MealPatch) -> anyhow::Result<Option<Meal>> {
        let mut data = self.data.lock().unwrap();
        Ok(data.meals.iter_mut().find(|m| m.id == id).map(|m| {
            patch.apply(m);
            m.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut data = self.data.lock().unwrap();
        let before = data.meals.len();
        data.meals.retain(|m| m.id != id);
        data.attendances.retain(|a| a.meal_id != id);
        Ok(data.meals.len() != before)
    }

    async fn record_wastage(
        &self,
        id: Uuid,
        wastage: ManualWastage,
    ) -> anyhow::Result<Option<Meal>> {
        let mut data = self.data.lock().unwrap();
        Ok(data.meals.iter_mut().find(|m| m.id == id).map(|m| {
            m.wastage = wastage;
            m.clone()
        }))
    }

    async fn latest_timings(&self) -> anyhow::Result<Vec<SlotTiming>> {
        let data = self.data.lock().unwrap();
        let mut latest: HashMap<MealType, &Meal> = HashMap::new();
        for m in &data.meals {
            let e = latest.entry(m.meal_type).or_insert(m);
            if m.date > e.date {
                *e = m;
            }
        }
        Ok(latest
            .into_values()
            .map(|m| SlotTiming {
                meal_type: m.meal_type,
                meal_time: m.meal_time,
                cancel_cutoff: m.cancel_cutoff,
            })
            .collect())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn get_or_create(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Attendance> {
        let mut data = self.data.lock().unwrap();
        if let Some(a) = data
            .attendances
            .iter()
            .find(|a| a.user_id == user_id && a.meal_id == meal_id)
        {
            return Ok(a.clone());
        }
        let row = Attendance::fresh(user_id, meal_id);
        data.attendances.push(row.clone());
        Ok(row)
    }

    async fn save(&self, attendance: &Attendance) -> anyhow::Result<Attendance> {
        let mut data = self.data.lock().unwrap();
        let row = data
            .attendances
            .iter_mut()
            .find(|a| a.id == attendance.id)
            .ok_or_else(|| anyhow!("attendance {} not found", attendance.id))?;
        *row = attendance.clone();
        Ok(row.clone())
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
    ) -> anyhow::Result<Vec<Attendance>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .attendances
            .iter()
            .filter(|a| a.user_id == user_id && meal_ids.contains(&a.meal_id))
            .cloned()
            .collect())
    }

    async fn tally(&self, meal_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, MealTally>> {
        let data = self.data.lock().unwrap();
        Ok(MealTally::by_meal(
            data.attendances
                .iter()
                .filter(|a| meal_ids.contains(&a.meal_id)),
        ))
    }

    async fn mark_not_eating(
        &self,
        user_id: Uuid,
        meal_ids: &[Uuid],
        skip_reason: &str,
    ) -> anyhow::Result<u64> {
        let mut data = self.data.lock().unwrap();
        let mut changed = 0;
        for &meal_id in meal_ids {
            match data
                .attendances
                .iter_mut()
                .find(|a| a.user_id == user_id && a.meal_id == meal_id)
            {
                Some(a) if a.status == AttendanceStatus::NotEating => {}
                Some(a) => {
                    a.status = AttendanceStatus::NotEating;
                    a.skip_reason = Some(skip_reason.to_string());
                    changed += 1;
                }
                None => {
                    let mut row = Attendance::fresh(user_id, meal_id);
                    row.status = AttendanceStatus::NotEating;
                    row.skip_reason = Some(skip_reason.to_string());
                    data.attendances.push(row);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn restore_going(&self, user_id: Uuid, meal_ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut data = self.data.lock().unwrap();
        let mut changed = 0;
        for a in data.attendances.iter_mut().filter(|a| {
            a.user_id == user_id
                && meal_ids.contains(&a.meal_id)
                && a.status == AttendanceStatus::NotEating
        }) {
            a.status = AttendanceStatus::Going;
            a.skip_reason = None;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_skips(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let data = self.data.lock().unwrap();
        Ok(data
            .attendances
            .iter()
            .filter(|a| a.user_id == user_id && a.status == AttendanceStatus::NotEating)
            .count() as i64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn count_by_role(&self, role: UserRole) -> anyhow::Result<i64> {
        let data = self.data.lock().unwrap();
        Ok(data.users.iter().filter(|u| u.role == role).count() as i64)
    }

    async fn add_karma(&self, user_id: Uuid, points: i32) -> anyhow::Result<()> {
        let mut data = self.data.lock().unwrap();
        if let Some(u) = data.users.iter_mut().find(|u| u.id == user_id) {
            u.karma_points += points;
        }
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let data = self.data.lock().unwrap();
        Ok(data.users.iter().find(|u| u.id == user_id).cloned())
    }
}

/// Sends one request through the full router and returns status, headers
/// and the raw body text.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, String) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Like [`send_raw`] with the body parsed as JSON (`Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, text) = send_raw(app, method, uri, token, body).await;
    let json = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, json)
}
