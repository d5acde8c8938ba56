use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{notification::SmsSender, services::auth_service::Authenticator};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub auth: Arc<Authenticator>,
    pub sms: Arc<dyn SmsSender>,
}
