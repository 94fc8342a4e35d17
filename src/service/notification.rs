//! Password-set and password-reset email delivery.

use poem::Request;
use poem_openapi::Enum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    client::{Mailer, OutgoingEmail},
    core::{
        error::ServiceError,
        security::{encode_uid, make_password_reset_token},
        utils::truncate_chars,
    },
    model::user::User,
    settings::{Config, SiteSettings},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[oai(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BulkOutcome {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
    pub notices: Vec<Notice>,
}

/// What the incoming request tells us about the public host.
#[derive(Clone, Debug, Default)]
pub struct LinkContext {
    pub host: Option<String>,
    pub secure: bool,
}

impl LinkContext {
    /// Forwarded headers are only read when trusted. A host outside the
    /// allow-list is dropped so links fall back to the configured domain.
    pub fn from_request(req: &Request, site: &SiteSettings) -> Self {
        let forwarded_host = site
            .trust_forwarded_host
            .then(|| req.header("x-forwarded-host"))
            .flatten()
            .and_then(|x| x.split(',').next())
            .map(str::trim);
        let host = forwarded_host
            .or_else(|| req.header("host"))
            .map(str::to_string)
            .or_else(|| req.uri().authority().map(|x| x.to_string()));
        let host = match host {
            Some(host) if site.is_allowed_host(&host) => Some(host),
            Some(host) => {
                warn!("ignoring disallowed host {:?} for absolute links", host);
                None
            }
            None => None,
        };
        let forwarded_https = site.trust_forwarded_proto
            && req
                .header("x-forwarded-proto")
                .map(|x| x.trim().eq_ignore_ascii_case("https"))
                .unwrap_or(false);
        let secure = forwarded_https || req.uri().scheme_str() == Some("https");
        Self { host, secure }
    }
}

pub fn absolute_url(site: &SiteSettings, ctx: &LinkContext, path: &str) -> String {
    let scheme = if ctx.secure || site.force_https {
        "https"
    } else {
        "http"
    };
    let domain = site
        .domain
        .as_deref()
        .or(ctx.host.as_deref())
        .unwrap_or("localhost:8000");
    format!("{}://{}{}", scheme, domain, path)
}

/// Path of the password confirmation endpoint under the route prefix.
pub fn password_set_path(prefix: &str, uid: &str, token: &str) -> String {
    format!("{}/reset/{}/{}/", prefix.trim_end_matches('/'), uid, token)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmailTemplate {
    /// account created by staff, first password
    PasswordSet,
    /// self-service "forgot password"
    PasswordReset,
}

pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn render_email(template: EmailTemplate, name: &str, link: &str) -> RenderedEmail {
    let (subject, heading, intro, button) = match template {
        EmailTemplate::PasswordSet => (
            "Your PSI Vision account — set your password",
            format!("Welcome, {} ✨", name),
            "Your PSI Vision account is ready.",
            "Set your password",
        ),
        EmailTemplate::PasswordReset => (
            "Reset your PSI Vision password",
            format!("Hi {}", name),
            "We received a request to reset your PSI Vision password.",
            "Choose a new password",
        ),
    };
    let html = format!(
        r#"<div style="font-family:Inter,system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;line-height:1.6">
  <h2 style="color:#1A237E;margin:0 0 12px">{heading}</h2>
  <p>{intro}</p>
  <p>
    <a href="{link}" style="background:#1A237E;color:#fff;text-decoration:none;padding:10px 16px;border-radius:10px;display:inline-block">{button}</a>
  </p>
  <p>If the button doesn't work, paste this URL into your browser:</p>
  <p style="word-break:break-all"><a href="{link}">{link}</a></p>
  <hr style="border:none;border-top:1px solid #eee;margin:16px 0"/>
  <p style="color:#777;font-size:12px">If you didn't expect this email, you can ignore it.</p>
</div>"#
    );
    let text = format!(
        "Hi {name},\n\n{intro}\n\n{button}: {link}\n\nIf you didn't expect this email, you can ignore it.\n"
    );
    RenderedEmail {
        subject: subject.to_string(),
        html,
        text,
    }
}

/// Human readable reason for a non-2xx answer of the email API.
pub fn describe_failure(status: u16, body: &str) -> String {
    match status {
        422 => "422 Unprocessable Entity (is your From domain/sender verified in Resend?)."
            .to_string(),
        429 => "429 Too Many Requests (rate limited by Resend). Try again shortly.".to_string(),
        _ => format!("{} – {}", status, truncate_chars(body, 300)),
    }
}

enum Delivery {
    Sent,
    Failed(String),
}

async fn deliver(
    mailer: &dyn Mailer,
    config: &Config,
    ctx: &LinkContext,
    user: &User,
    to: &str,
    template: EmailTemplate,
) -> Delivery {
    let mail = config.mail_settings();
    let Some(from) = mail.from else {
        return Delivery::Failed("Missing RESEND_FROM or DEFAULT_FROM_EMAIL.".to_string());
    };
    let token = match make_password_reset_token(user, config) {
        Ok(val) => val,
        Err(err) => return Delivery::Failed(err.to_string()),
    };
    let site = config.site_settings();
    let path = password_set_path(&site.prefix, &encode_uid(&user.id), &token);
    let link = absolute_url(&site, ctx, &path);
    let rendered = render_email(template, &user.display_name(), &link);
    let email = OutgoingEmail {
        from,
        to: vec![to.to_string()],
        subject: rendered.subject,
        html: rendered.html,
        text: rendered.text,
        reply_to: mail.reply_to,
    };
    match mailer.send(&email).await {
        Ok(res) if res.status == 200 || res.status == 201 => Delivery::Sent,
        Ok(res) => Delivery::Failed(format!("Resend error {}", describe_failure(res.status, &res.body))),
        Err(ServiceError::Transport(err)) => Delivery::Failed(format!("Network error – {}", err)),
        Err(err) => Delivery::Failed(err.to_string()),
    }
}

/// Sends a password-set email to every selected account, one after another.
/// A failing recipient never stops the rest of the batch.
pub async fn send_password_set_emails(
    mailer: &dyn Mailer,
    config: &Config,
    ctx: &LinkContext,
    users: &[User],
) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    let mail = config.mail_settings();
    if mail.api_key.is_none() {
        outcome
            .notices
            .push(Notice::new(NoticeLevel::Error, "Missing RESEND_API_KEY."));
        return outcome;
    }
    if mail.from.is_none() {
        outcome.notices.push(Notice::new(
            NoticeLevel::Error,
            "Missing RESEND_FROM or DEFAULT_FROM_EMAIL.",
        ));
        return outcome;
    }

    for user in users {
        let Some(email) = user.email.as_deref().map(str::trim).filter(|x| !x.is_empty()) else {
            outcome.skipped += 1;
            continue;
        };
        match deliver(mailer, config, ctx, user, email, EmailTemplate::PasswordSet).await {
            Delivery::Sent => outcome.sent += 1,
            Delivery::Failed(reason) => {
                warn!("password-set email to {} failed: {}", email, reason);
                outcome.failed += 1;
                outcome
                    .notices
                    .push(Notice::new(NoticeLevel::Error, format!("{}: {}", email, reason)));
            }
        }
    }

    if outcome.sent > 0 {
        outcome.notices.push(Notice::new(
            NoticeLevel::Success,
            format!("Sent {} password-set email(s).", outcome.sent),
        ));
    }
    if outcome.skipped > 0 {
        outcome.notices.push(Notice::new(
            NoticeLevel::Warning,
            format!("Skipped {} user(s) without an email.", outcome.skipped),
        ));
    }
    if outcome.failed > 0 && outcome.sent == 0 {
        outcome.notices.push(Notice::new(
            NoticeLevel::Error,
            "Failed to send password-set emails.",
        ));
    }
    info!(
        "password-set batch done: sent={} skipped={} failed={}",
        outcome.sent, outcome.skipped, outcome.failed
    );
    outcome
}

/// Self-service reset link for one account. Returns whether it was sent.
pub async fn send_password_reset_email(
    mailer: &dyn Mailer,
    config: &Config,
    ctx: &LinkContext,
    user: &User,
) -> bool {
    let Some(email) = user.email.as_deref() else {
        return false;
    };
    match deliver(mailer, config, ctx, user, email, EmailTemplate::PasswordReset).await {
        Delivery::Sent => true,
        Delivery::Failed(reason) => {
            warn!("password-reset email to {} failed: {}", email, reason);
            false
        }
    }
}
