use crate::{
    chat::ChatHub,
    config::AppConfig,
    db::{DbPool, OrmConn},
    email::Mailer,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub hub: ChatHub,
    pub mailer: Mailer,
    pub chat_notify_email: Option<String>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: &AppConfig) -> Self {
        Self {
            pool,
            orm,
            hub: ChatHub::new(),
            mailer: Mailer::from_config(config),
            chat_notify_email: config.chat_notify_email.clone(),
        }
    }
}
