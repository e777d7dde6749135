use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::ResourceEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<ResourceEngine>,
}
