use std::sync::Arc;

use db::DBService;
use services::services::{config::SchedulerConfig, push::PushNotifier};

pub mod error;
pub mod routes;

/// Shared handles passed to every route
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub notifier: Arc<dyn PushNotifier>,
    pub config: Arc<SchedulerConfig>,
}

impl AppState {
    pub fn new(db: DBService, notifier: Arc<dyn PushNotifier>, config: SchedulerConfig) -> Self {
        Self {
            db,
            notifier,
            config: Arc::new(config),
        }
    }
}
