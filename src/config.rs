use argon2::password_hash::PasswordHash;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    /// Admin credential used by /auth/login. The hash is a PHC-format argon2
    /// string; startup fails when it does not parse.
    pub admin_username: String,
    pub admin_password_hash: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_scan_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub whatsapp: WhatsAppConfig,
}

/// Twilio WhatsApp settings. All fields are required once `WHATSAPP_ENABLED`
/// is true; there is no built-in fallback number.
#[derive(Clone)]
pub struct WhatsAppConfig {
    pub enabled: bool,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender address, e.g. "whatsapp:+14155238886"
    pub from_number: String,
    /// Manager number receiving confirmations and summaries
    pub manager_phone: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let admin_password_hash =
            env::var("ADMIN_PASSWORD_HASH").expect("ADMIN_PASSWORD_HASH must be set");
        PasswordHash::new(&admin_password_hash)
            .expect("ADMIN_PASSWORD_HASH must be a valid argon2 PHC string");

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),

            admin_username: env::var("ADMIN_USERNAME").expect("ADMIN_USERNAME must be set"),
            admin_password_hash,

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_scan_per_min: env::var("RATE_SCAN_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            whatsapp: WhatsAppConfig::from_env(),
        }
    }
}

impl WhatsAppConfig {
    fn from_env() -> Self {
        let enabled = env::var("WHATSAPP_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        if enabled {
            Self {
                enabled,
                account_sid: env::var("WHATSAPP_ACCOUNT_SID")
                    .expect("WHATSAPP_ACCOUNT_SID must be set when WHATSAPP_ENABLED=true"),
                auth_token: env::var("WHATSAPP_AUTH_TOKEN")
                    .expect("WHATSAPP_AUTH_TOKEN must be set when WHATSAPP_ENABLED=true"),
                from_number: env::var("WHATSAPP_FROM_NUMBER")
                    .expect("WHATSAPP_FROM_NUMBER must be set when WHATSAPP_ENABLED=true"),
                manager_phone: env::var("MANAGER_PHONE")
                    .expect("MANAGER_PHONE must be set when WHATSAPP_ENABLED=true"),
            }
        } else {
            Self {
                enabled,
                account_sid: String::new(),
                auth_token: String::new(),
                from_number: String::new(),
                manager_phone: String::new(),
            }
        }
    }
}
