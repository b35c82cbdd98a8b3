use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub email_endpoint: Option<String>,
    pub email_api_key: Option<String>,
    pub chat_notify_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let email_endpoint = env::var("EMAIL_ENDPOINT").ok().filter(|v| !v.is_empty());
        let email_api_key = env::var("EMAIL_API_KEY").ok().filter(|v| !v.is_empty());
        let chat_notify_email = env::var("CHAT_NOTIFY_EMAIL").ok().filter(|v| !v.is_empty());
        Ok(Self {
            database_url,
            host,
            port,
            email_endpoint,
            email_api_key,
            chat_notify_email,
        })
    }
}
