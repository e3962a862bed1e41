use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::core::{AppError, Result};

/// Outbound confirmation mail. Failures are logged by callers and never
/// fail the enclosing payment operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_purchase_confirmation(&self, mail: PurchaseMail) -> Result<()>;

    async fn send_installment_receipt(&self, mail: InstallmentMail) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PurchaseMail {
    pub to: String,
    pub student_name: String,
    pub course_title: String,
    pub receipt_number: String,
    pub amount_paid: Decimal,
    pub is_emi: bool,
}

#[derive(Debug, Clone)]
pub struct InstallmentMail {
    pub to: String,
    pub student_name: String,
    pub installment_number: i32,
    pub total_installments: i32,
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
}

/// SMTP-backed notifier. When SMTP is disabled in config the send calls
/// log and return Ok, so development environments need no mail server.
pub struct SmtpNotifier {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let transport = match &self.transport {
            Some(t) => t,
            None => {
                info!(to = to, subject = subject, "SMTP disabled, skipping email");
                return Ok(());
            }
        };

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_purchase_confirmation(&self, mail: PurchaseMail) -> Result<()> {
        let plan = if mail.is_emi {
            "first EMI installment"
        } else {
            "full course fee"
        };

        let html = format!(
            r#"<html><body>
<h2>Payment received</h2>
<p>Dear {name},</p>
<p>We have received your {plan} of <strong>&#8377;{amount}</strong> for
<strong>{course}</strong>.</p>
<p>Receipt number: <strong>{receipt}</strong></p>
<p>Happy learning!</p>
</body></html>"#,
            name = mail.student_name,
            plan = plan,
            amount = mail.amount_paid,
            course = mail.course_title,
            receipt = mail.receipt_number,
        );

        self.send_html(&mail.to, "Payment confirmation", html).await
    }

    async fn send_installment_receipt(&self, mail: InstallmentMail) -> Result<()> {
        let html = format!(
            r#"<html><body>
<h2>Installment received</h2>
<p>Dear {name},</p>
<p>We have received installment <strong>{number} of {total}</strong>
(&#8377;{amount}).</p>
<p>Remaining balance: &#8377;{remaining}</p>
</body></html>"#,
            name = mail.student_name,
            number = mail.installment_number,
            total = mail.total_installments,
            amount = mail.amount_paid,
            remaining = mail.remaining_amount,
        );

        self.send_html(&mail.to, "Installment payment received", html)
            .await
    }
}

/// Log the failure of a best-effort notification without propagating it
pub fn log_email_failure(context: &str, err: &AppError) {
    warn!(context = context, error = %err, "Confirmation email failed, continuing");
}
