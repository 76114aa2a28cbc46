use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rolegate_application::DEFAULT_PARTITION;
use rolegate_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationProviderConfig {
    Console,
    Webhook { endpoint: Url },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub log_level: String,
    pub approval_api_url: Url,
    pub role_assumption_url: Url,
    pub aws_partition: String,
    pub state_machine_arn: String,
    pub topic_arn: String,
    pub notification_provider: NotificationProviderConfig,
    pub notification_max_attempts: u8,
    pub notification_retry_backoff_ms: u64,
    pub approval_max_retries: u32,
    pub approval_retry_delay: Duration,
    pub execution_poll_interval: Duration,
    pub execution_max_wait: Option<Duration>,
    pub execution_timeout: Option<Duration>,
    pub http_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let approval_api_url = parse_url("APPROVAL_API_URL", required(&lookup, "APPROVAL_API_URL")?)?;
        let state_machine_name = required(&lookup, "STATE_MACHINE_NAME")?;
        let topic_name = required(&lookup, "TOPIC_NAME")?;
        let log_level = required(&lookup, "LOG_LEVEL")?.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(AppError::Validation(format!(
                "LOG_LEVEL must be one of {}, got '{log_level}'",
                LOG_LEVELS.join(", ")
            )));
        }

        let aws_region = required(&lookup, "AWS_REGION")?;
        let aws_account_id = required(&lookup, "AWS_ACCOUNT_ID")?;
        if !aws_account_id.chars().all(|character| character.is_ascii_digit()) {
            return Err(AppError::Validation(
                "AWS_ACCOUNT_ID must contain only digits".to_owned(),
            ));
        }
        let role_assumption_url =
            parse_url("ROLE_ASSUMPTION_URL", required(&lookup, "ROLE_ASSUMPTION_URL")?)?;

        let aws_partition =
            optional(&lookup, "AWS_PARTITION").unwrap_or_else(|| DEFAULT_PARTITION.to_owned());
        let api_host = optional(&lookup, "API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or(&lookup, "API_PORT", 3001_u16)?;

        let notification_provider = match optional(&lookup, "NOTIFICATION_PROVIDER")
            .unwrap_or_else(|| "console".to_owned())
            .as_str()
        {
            "console" => NotificationProviderConfig::Console,
            "webhook" => NotificationProviderConfig::Webhook {
                endpoint: parse_url(
                    "NOTIFICATION_WEBHOOK_URL",
                    required(&lookup, "NOTIFICATION_WEBHOOK_URL")?,
                )?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "NOTIFICATION_PROVIDER must be either 'console' or 'webhook', got '{other}'"
                )));
            }
        };

        let execution_max_wait_seconds = parse_or(&lookup, "EXECUTION_MAX_WAIT_SECONDS", 900_u64)?;
        let execution_timeout_seconds = parse_or(&lookup, "EXECUTION_TIMEOUT_SECONDS", 0_u64)?;
        let execution_poll_interval_ms = parse_or(&lookup, "EXECUTION_POLL_INTERVAL_MS", 1_000_u64)?;
        if execution_poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "EXECUTION_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        let config = Self {
            api_host,
            api_port,
            log_level,
            approval_api_url,
            role_assumption_url,
            state_machine_arn: format!(
                "arn:{aws_partition}:states:{aws_region}:{aws_account_id}:stateMachine:{state_machine_name}"
            ),
            topic_arn: format!("arn:{aws_partition}:sns:{aws_region}:{aws_account_id}:{topic_name}"),
            aws_partition,
            notification_provider,
            notification_max_attempts: parse_or(&lookup, "NOTIFICATION_MAX_ATTEMPTS", 3_u8)?,
            notification_retry_backoff_ms: parse_or(&lookup, "NOTIFICATION_RETRY_BACKOFF_MS", 250_u64)?,
            approval_max_retries: parse_or(&lookup, "APPROVAL_MAX_RETRIES", 5_u32)?,
            approval_retry_delay: Duration::from_secs(parse_or(
                &lookup,
                "APPROVAL_RETRY_DELAY_SECONDS",
                30_u64,
            )?),
            execution_poll_interval: Duration::from_millis(execution_poll_interval_ms),
            execution_max_wait: (execution_max_wait_seconds > 0)
                .then(|| Duration::from_secs(execution_max_wait_seconds)),
            execution_timeout: (execution_timeout_seconds > 0)
                .then(|| Duration::from_secs(execution_timeout_seconds)),
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 15_u64)?),
        };
        config.ensure_deadlines_cover_approval()?;

        Ok(config)
    }

    /// Worst-case time one execution needs to reach approval or denial.
    ///
    /// Counts every retry delay and one HTTP timeout per outbound call:
    /// each approval check, each notification attempt with its backoff, and
    /// the final role assumption.
    pub fn approval_budget(&self) -> Duration {
        let checks = self.approval_max_retries.saturating_add(1);
        let notification_attempts = u32::from(self.notification_max_attempts.max(1));
        let notification_backoff = Duration::from_millis(self.notification_retry_backoff_ms)
            .saturating_mul(notification_attempts.saturating_mul(notification_attempts));

        self.approval_retry_delay
            .saturating_mul(self.approval_max_retries)
            .saturating_add(self.http_timeout.saturating_mul(checks))
            .saturating_add(self.http_timeout.saturating_mul(notification_attempts))
            .saturating_add(notification_backoff)
            .saturating_add(self.http_timeout)
    }

    // A deadline inside the approval budget would turn a denial into a timeout.
    fn ensure_deadlines_cover_approval(&self) -> Result<(), AppError> {
        let budget = self.approval_budget();
        for (name, limit) in [
            ("EXECUTION_MAX_WAIT_SECONDS", self.execution_max_wait),
            ("EXECUTION_TIMEOUT_SECONDS", self.execution_timeout),
        ] {
            if let Some(limit) = limit
                && limit < budget
            {
                return Err(AppError::Validation(format!(
                    "{name} ({}s) must be at least the approval budget of {}s derived from \
                     APPROVAL_MAX_RETRIES, APPROVAL_RETRY_DELAY_SECONDS and HTTP_TIMEOUT_SECONDS",
                    limit.as_secs(),
                    budget.as_secs_f64().ceil()
                )));
            }
        }

        Ok(())
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    optional(lookup, name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
        })
        .transpose()
        .map(|value| value.unwrap_or(default))
}

fn parse_url(name: &str, value: String) -> Result<Url, AppError> {
    let url = Url::parse(value.as_str())
        .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{name} must be an http or https URL"
        )));
    }

    Ok(url)
}
