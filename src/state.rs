use crate::attendance::repo::AttendanceStore;
use crate::auth::repo::UserStore;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::meals::repo::MealStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meals: Arc<dyn MealStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(PgStore::connect(&config).await?);
        Ok(Self::from_parts(config, store))
    }

    /// Wires one backend into all three store seams.
    pub fn from_parts<S>(config: Arc<AppConfig>, store: Arc<S>) -> Self
    where
        S: MealStore + AttendanceStore + UserStore + 'static,
    {
        Self {
            config,
            meals: store.clone(),
            attendance: store.clone(),
            users: store,
        }
    }

    pub fn today(&self) -> time::Date {
        self.config.analytics.today()
    }
}
