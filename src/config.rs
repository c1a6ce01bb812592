use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub email: EmailConfig,

    #[command(flatten)]
    pub submission: SubmissionConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONTACT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "CONTACT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for liveness and readiness probes
    #[arg(long, env = "CONTACT_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "CONTACT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "CONTACT_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Contact submissions per second allowed for a single client
    #[arg(
        long = "rate-limit-per-second",
        env = "CONTACT_RATE_LIMIT_PER_SECOND",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=1_000_000_000)
    )]
    pub per_second: u32,

    /// Burst allowance for a single client
    #[arg(
        long = "rate-limit-burst",
        env = "CONTACT_RATE_LIMIT_BURST",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub burst: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Firestore,
    Postgres,
}

#[derive(Clone, Debug, Args)]
pub struct StoreConfig {
    /// Where submissions are recorded
    #[arg(long = "store-backend", env = "CONTACT_STORE_BACKEND", value_enum, default_value_t = StoreBackend::Firestore)]
    pub backend: StoreBackend,

    /// Upper bound on a single write, in milliseconds
    #[arg(
        id = "store_timeout_ms",
        long = "store-timeout-ms",
        env = "CONTACT_STORE_TIMEOUT_MS",
        default_value_t = 10_000
    )]
    pub timeout_ms: u64,

    /// Firestore project id
    #[arg(long, env = "CONTACT_FIRESTORE_PROJECT_ID")]
    pub firestore_project_id: Option<String>,

    /// Firestore web API key
    #[arg(long, env = "CONTACT_FIRESTORE_API_KEY")]
    pub firestore_api_key: Option<String>,

    /// Firestore REST base URL (override for the emulator)
    #[arg(long, env = "CONTACT_FIRESTORE_BASE_URL", default_value = "https://firestore.googleapis.com")]
    pub firestore_base_url: String,

    /// Postgres connection URL
    #[arg(long, env = "CONTACT_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, env = "CONTACT_DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long, env = "CONTACT_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub db_acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct EmailConfig {
    /// EmailJS REST base URL
    #[arg(long = "email-base-url", env = "CONTACT_EMAIL_BASE_URL", default_value = "https://api.emailjs.com")]
    pub base_url: String,

    /// EmailJS service id
    #[arg(long = "email-service-id", env = "CONTACT_EMAIL_SERVICE_ID")]
    pub service_id: String,

    /// Template used to alert the site owner
    #[arg(long = "email-operator-template-id", env = "CONTACT_EMAIL_OPERATOR_TEMPLATE_ID")]
    pub operator_template_id: String,

    /// Template used to acknowledge the visitor
    #[arg(long = "email-ack-template-id", env = "CONTACT_EMAIL_ACK_TEMPLATE_ID")]
    pub ack_template_id: String,

    /// EmailJS public key
    #[arg(long = "email-public-key", env = "CONTACT_EMAIL_PUBLIC_KEY")]
    pub public_key: String,

    /// EmailJS private key, required when the account enforces server-side access tokens
    #[arg(long = "email-access-token", env = "CONTACT_EMAIL_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Upper bound on a single send, in milliseconds
    #[arg(
        id = "email_timeout_ms",
        long = "email-timeout-ms",
        env = "CONTACT_EMAIL_TIMEOUT_MS",
        default_value_t = 10_000
    )]
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct SubmissionConfig {
    /// Tag stored with every record to identify the originating site
    #[arg(long, env = "CONTACT_SOURCE_TAG", default_value = "portfolio-website")]
    pub source_tag: String,

    /// Address offered to visitors when their message could not be recorded
    #[arg(long, env = "CONTACT_OWNER_EMAIL")]
    pub owner_email: Option<String>,

    /// How often idle per-client controllers are reclaimed
    #[arg(long, env = "CONTACT_REGISTRY_GC_INTERVAL_SECS", default_value_t = 60)]
    pub registry_gc_interval_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "CONTACT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; telemetry export is disabled when unset
    #[arg(long, env = "CONTACT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
