use std::env;

use anyhow::{anyhow, Context};
use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use crate::core::utils::{is_truthy, strip_quotes};

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String, // file / server
    pub host: String,
    pub port: u16,
    pub prefix: Option<String>,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_exp: u16,
    pub jwt_refresh_exp: u16,
    #[serde(default = "default_password_reset_exp")]
    pub password_reset_exp: u32,
    pub redis_url: String,
    pub debug: Option<String>,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    // AI provider
    pub openai_api_key: Option<String>,
    pub openai_org_id: Option<String>,
    pub openai_project_id: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    // Image hosting, either one url or three discrete values
    pub cloudinary_url: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    #[serde(default = "default_cloudinary_base_url")]
    pub cloudinary_base_url: String,

    // Transactional email
    pub resend_api_key: Option<String>,
    pub resend_from: Option<String>,
    pub default_from_email: Option<String>,
    pub resend_reply_to: Option<String>,
    #[serde(default = "default_resend_base_url")]
    pub resend_base_url: String,

    // Absolute links
    pub site_domain: Option<String>,
    pub secure_ssl_redirect: Option<String>,
    /// comma separated, `.psi.org` matches subdomains, `*` matches anything
    pub allowed_hosts: Option<String>,
    pub use_x_forwarded_host: Option<String>,
    pub use_x_forwarded_proto: Option<String>,
}

fn default_env() -> String {
    "file".to_string()
}

fn default_password_reset_exp() -> u32 {
    // three days, in minutes
    3 * 24 * 60
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_cloudinary_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Email settings as seen by the notification action.
#[derive(Clone, Debug)]
pub struct MailSettings {
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub reply_to: Option<String>,
}

/// Where absolute links in outgoing email point to.
#[derive(Clone, Debug, Default)]
pub struct SiteSettings {
    pub domain: Option<String>,
    pub force_https: bool,
    pub prefix: String,
    pub allowed_hosts: Vec<String>,
    pub trust_forwarded_host: bool,
    pub trust_forwarded_proto: bool,
}

impl SiteSettings {
    /// Matches `host` (port ignored) against the allow-list.
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.trim().to_lowercase();
        let name = match host.rsplit_once(':') {
            Some((name, port)) if !name.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                name
            }
            _ => host.as_str(),
        };
        if name.is_empty() {
            return false;
        }
        self.allowed_hosts.iter().any(|pattern| {
            pattern == "*"
                || pattern == name
                || (pattern.starts_with('.')
                    && (name.ends_with(pattern.as_str()) || name == &pattern[1..]))
        })
    }
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn flag(val: &Option<String>) -> bool {
    val.as_deref().map(is_truthy).unwrap_or(false)
}

impl Config {
    /// Strips quotes and blank values from every optional text setting.
    pub fn normalize(mut self) -> Self {
        for field in [
            &mut self.prefix,
            &mut self.debug,
            &mut self.openai_api_key,
            &mut self.openai_org_id,
            &mut self.openai_project_id,
            &mut self.cloudinary_url,
            &mut self.cloudinary_cloud_name,
            &mut self.cloudinary_api_key,
            &mut self.cloudinary_api_secret,
            &mut self.resend_api_key,
            &mut self.resend_from,
            &mut self.default_from_email,
            &mut self.resend_reply_to,
            &mut self.site_domain,
            &mut self.secure_ssl_redirect,
            &mut self.allowed_hosts,
            &mut self.use_x_forwarded_host,
            &mut self.use_x_forwarded_proto,
        ] {
            *field = strip_quotes(field.take());
        }
        for field in [
            &mut self.openai_base_url,
            &mut self.cloudinary_base_url,
            &mut self.resend_base_url,
        ] {
            if let Some(val) = strip_quotes(Some(field.clone())) {
                *field = val.trim_end_matches('/').to_string();
            }
        }
        self
    }

    pub fn is_debug(&self) -> bool {
        flag(&self.debug)
    }

    pub fn prefix(&self) -> String {
        self.prefix.clone().unwrap_or("/".to_string())
    }

    /// Resolves image hosting credentials from `CLOUDINARY_URL`, falling back
    /// to the discrete variables. `Ok(None)` means nothing is configured.
    pub fn cloudinary_credentials(&self) -> anyhow::Result<Option<CloudinaryCredentials>> {
        if let Some(url) = &self.cloudinary_url {
            return parse_cloudinary_url(url).map(Some);
        }
        match (
            &self.cloudinary_cloud_name,
            &self.cloudinary_api_key,
            &self.cloudinary_api_secret,
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Some(CloudinaryCredentials {
                cloud_name: cloud_name.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            })),
            _ => Ok(None),
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            api_key: self.resend_api_key.clone(),
            from: self
                .resend_from
                .clone()
                .or_else(|| self.default_from_email.clone()),
            reply_to: self.resend_reply_to.clone(),
        }
    }

    pub fn site_settings(&self) -> SiteSettings {
        let allowed_hosts = match &self.allowed_hosts {
            Some(hosts) => hosts
                .split(',')
                .map(|x| x.trim().to_lowercase())
                .filter(|x| !x.is_empty())
                .collect(),
            None => default_allowed_hosts(),
        };
        SiteSettings {
            domain: self.site_domain.clone(),
            force_https: flag(&self.secure_ssl_redirect),
            prefix: self.prefix(),
            allowed_hosts,
            trust_forwarded_host: flag(&self.use_x_forwarded_host),
            trust_forwarded_proto: flag(&self.use_x_forwarded_proto),
        }
    }
}

/// `cloudinary://<api_key>:<api_secret>@<cloud_name>`
pub fn parse_cloudinary_url(url: &str) -> anyhow::Result<CloudinaryCredentials> {
    let parsed = Url::parse(url).context("CLOUDINARY_URL is not a valid url")?;
    if parsed.scheme() != "cloudinary" {
        return Err(anyhow!("CLOUDINARY_URL must use the cloudinary:// scheme"));
    }
    let cloud_name = parsed.host_str().unwrap_or_default();
    let api_key = parsed.username();
    let api_secret = parsed.password().unwrap_or_default();
    if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
        return Err(anyhow!(
            "CLOUDINARY_URL must look like cloudinary://<api_key>:<api_secret>@<cloud_name>"
        ));
    }
    Ok(CloudinaryCredentials {
        cloud_name: cloud_name.to_string(),
        api_key: api_key.to_string(),
        api_secret: api_secret.to_string(),
    })
}

pub fn get_config() -> anyhow::Result<Config> {
    let env_var = env::var("ENV").unwrap_or("file".to_string());
    if env_var == "file" {
        info!("using .env file as environtment variable");
        let _ = dotenvy::dotenv();
    } else {
        info!("using server environtment as environtment variable");
    }
    let config = envy::from_env::<Config>()
        .context("failed to read configuration from environment")?
        .normalize();
    // surface a malformed CLOUDINARY_URL at startup instead of on first upload
    config.cloudinary_credentials()?;
    Ok(config)
}
