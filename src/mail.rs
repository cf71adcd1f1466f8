use crate::config;
use crate::model::ApplicationStatus;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

/// Outcome of a reviewed application, as told to the student.
#[derive(Debug, Clone)]
pub struct Decision {
    pub to: String,
    pub student_name: String,
    pub project_title: String,
    pub status: ApplicationStatus,
    pub professor_name: String,
}

/// Seam for the decision notification. The status update must never fail
/// because a notification could not be sent, so callers log errors and
/// move on.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_decision(&self, decision: &Decision) -> Result<()>;
}

/// SMTP notifier. Message assembly errors are reported to the caller; the
/// actual relay exchange happens on a detached task so a slow or broken
/// relay never delays the response.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    app_url: String,
}

impl Mailer {
    pub fn new(config: &config::Mail) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.relay)
            .wrap_err("cannot configure mail relay")?
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config
                .from
                .parse()
                .wrap_err("cannot parse mail sender address")?,
            app_url: config.app_url.clone(),
        })
    }
}

#[async_trait]
impl Notify for Mailer {
    async fn send_decision(&self, decision: &Decision) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(decision
                .to
                .parse()
                .wrap_err("cannot parse recipient address")?)
            .subject(subject(decision))
            .header(ContentType::TEXT_HTML)
            .body(body(decision, &self.app_url))
            .wrap_err("cannot build notification message")?;
        let transport = self.transport.clone();
        let to = decision.to.clone();
        tokio::spawn(async move {
            if let Err(error) = transport.send(message).await {
                warn!(%error, to = %to, "decision notification failed");
            }
        });
        Ok(())
    }
}

/// Stand-in when `[mail]` is disabled: decisions are only logged.
pub struct NoMailer;

#[async_trait]
impl Notify for NoMailer {
    async fn send_decision(&self, decision: &Decision) -> Result<()> {
        debug!(
            to = %decision.to,
            project = %decision.project_title,
            status = %decision.status,
            "mail disabled, decision notification skipped",
        );
        Ok(())
    }
}

fn subject(decision: &Decision) -> String {
    if decision.status == ApplicationStatus::Accepted {
        format!("Application Accepted - {}", decision.project_title)
    } else {
        format!("Application Update - {}", decision.project_title)
    }
}

fn body(decision: &Decision, app_url: &str) -> String {
    let verdict = if decision.status == ApplicationStatus::Accepted {
        format!(
            "<p>Congratulations! Your application for the research project \
             <strong>\"{title}\"</strong> has been <strong>accepted</strong>.</p>\
             <p>Professor {professor} has reviewed your application and is excited \
             to have you join the research team. Log in to your dashboard for the \
             project details; the professor may contact you shortly with further \
             instructions.</p>",
            title = decision.project_title,
            professor = decision.professor_name,
        )
    } else {
        format!(
            "<p>Thank you for your interest in the research project \
             <strong>\"{title}\"</strong>.</p>\
             <p>After careful consideration, we regret to inform you that your \
             application has not been accepted at this time. We encourage you to \
             keep exploring other research opportunities and to apply to projects \
             matching your interests.</p>",
            title = decision.project_title,
        )
    };
    format!(
        "<!DOCTYPE html>\
         <html><body>\
         <h1>Research Bridge</h1>\
         <p>Dear {student},</p>\
         {verdict}\
         <p><a href=\"{app_url}/dashboard\">View Dashboard</a></p>\
         <p><small>This is an automated message from Research Bridge. \
         Please do not reply to this email.</small></p>\
         </body></html>",
        student = decision.student_name,
    )
}
