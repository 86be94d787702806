use std::path::PathBuf;

/// Which `lettre` transport delivers notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransportKind {
    /// Local `sendmail` binary, like the host `mail` command.
    Sendmail,
    /// SMTP relay configured through `SMTP_*` variables.
    Smtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    Tls,
    StartTls,
    None,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mail_to: String,
    pub mail_from: String,
    pub mail_reply_to: String,
    pub mail_transport: MailTransportKind,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: SmtpTls,
    pub mail_timeout_secs: u64,
    pub success_log_path: PathBuf,
    pub error_log_path: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            mail_to: "service-avto@mail.ru".to_string(),
            mail_from: "noreply@servavto.ru".to_string(),
            mail_reply_to: "noreply@servavto.ru".to_string(),
            mail_transport: MailTransportKind::Sendmail,
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: SmtpTls::StartTls,
            mail_timeout_secs: 10,
            success_log_path: PathBuf::from("form_submissions.log"),
            error_log_path: PathBuf::from("form_errors.log"),
            static_dir: None,
            max_body_bytes: 64 * 1024,
            rate_limit_per_second: 2,
            rate_limit_burst: 10,
        }
    }
}

/// Reads an optional variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T, hint: &str) -> anyhow::Result<T> {
    match optional_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be {}", name, hint)),
        None => Ok(default),
    }
}

fn email_var(name: &str, default: &str) -> anyhow::Result<String> {
    let value = optional_var(name).unwrap_or_else(|| default.to_string());
    if !value.contains('@') {
        anyhow::bail!("{} must be an email address", name);
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let mail_from = email_var("MAIL_FROM", &defaults.mail_from)?;

        let mail_transport = match optional_var("MAIL_TRANSPORT").as_deref() {
            None | Some("sendmail") => MailTransportKind::Sendmail,
            Some("smtp") => MailTransportKind::Smtp,
            Some(other) => anyhow::bail!(
                "MAIL_TRANSPORT must be 'sendmail' or 'smtp', got '{}'",
                other
            ),
        };

        let smtp_tls = match optional_var("SMTP_TLS").as_deref() {
            None | Some("starttls") => SmtpTls::StartTls,
            Some("tls") => SmtpTls::Tls,
            Some("none") => SmtpTls::None,
            Some(other) => anyhow::bail!(
                "SMTP_TLS must be 'tls', 'starttls' or 'none', got '{}'",
                other
            ),
        };

        let smtp_host = optional_var("SMTP_HOST");
        if mail_transport == MailTransportKind::Smtp && smtp_host.is_none() {
            anyhow::bail!("SMTP_HOST is required when MAIL_TRANSPORT=smtp");
        }

        let smtp_username = optional_var("SMTP_USERNAME");
        let smtp_password = optional_var("SMTP_PASSWORD");
        if smtp_username.is_some() != smtp_password.is_some() {
            anyhow::bail!("SMTP_USERNAME and SMTP_PASSWORD must be set together");
        }

        let smtp_port = match optional_var("SMTP_PORT") {
            Some(raw) => Some(raw.parse().map_err(|_| {
                anyhow::anyhow!("SMTP_PORT must be a valid number between 1-65535")
            })?),
            None => None,
        };

        let mail_timeout_secs = parse_var(
            "MAIL_TIMEOUT_SECS",
            defaults.mail_timeout_secs,
            "a positive number of seconds",
        )?;
        if mail_timeout_secs == 0 {
            anyhow::bail!("MAIL_TIMEOUT_SECS must be greater than 0");
        }

        let rate_limit_per_second = parse_var(
            "RATE_LIMIT_PER_SECOND",
            defaults.rate_limit_per_second,
            "a positive number",
        )?;
        let rate_limit_burst = parse_var(
            "RATE_LIMIT_BURST",
            defaults.rate_limit_burst,
            "a positive number",
        )?;
        if rate_limit_per_second == 0 || rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be greater than 0");
        }

        let config = Self {
            port: parse_var("PORT", defaults.port, "a valid number between 1-65535")?,
            mail_to: email_var("MAIL_TO", &defaults.mail_to)?,
            mail_reply_to: email_var("MAIL_REPLY_TO", &mail_from)?,
            mail_from,
            mail_transport,
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            smtp_tls,
            mail_timeout_secs,
            success_log_path: optional_var("SUCCESS_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.success_log_path),
            error_log_path: optional_var("ERROR_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.error_log_path),
            static_dir: optional_var("STATIC_DIR").map(PathBuf::from),
            max_body_bytes: parse_var(
                "MAX_BODY_BYTES",
                defaults.max_body_bytes,
                "a number of bytes",
            )?,
            rate_limit_per_second,
            rate_limit_burst,
        };

        // Log successful configuration load (without credentials)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Mail recipient: {}", config.mail_to);
        tracing::debug!("Mail transport: {:?}", config.mail_transport);
        if let Some(ref host) = config.smtp_host {
            tracing::debug!("SMTP host: {} ({:?})", host, config.smtp_tls);
        }
        tracing::debug!(
            "Submission logs: {} / {}",
            config.success_log_path.display(),
            config.error_log_path.display()
        );
        if let Some(ref dir) = config.static_dir {
            tracing::info!("Serving static site from {}", dir.display());
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
