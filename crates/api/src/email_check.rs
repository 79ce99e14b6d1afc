//! Email address checks applied before an address is stored
//!
//! Two stages: a syntactic check of the address, then (for new and changed
//! addresses) a DNS check that the domain can receive mail.

use async_trait::async_trait;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::TokioAsyncResolver;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_LABEL_LENGTH: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailFormatError {
    #[error("Email address is empty")]
    Empty,
    #[error("Email address is too long")]
    TooLong,
    #[error("Email address must contain exactly one '@'")]
    AtSymbol,
    #[error("The part before the @-sign is not valid")]
    LocalPart,
    #[error("The domain name is not valid")]
    Domain,
}

/// Syntactic address check (dot-atom local part, dotted hostname domain)
pub fn validate_email_format(email: &str) -> Result<(), EmailFormatError> {
    if email.is_empty() {
        return Err(EmailFormatError::Empty);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(EmailFormatError::TooLong);
    }

    let (local, domain) = match email.split_once('@') {
        Some((local, domain)) if !domain.contains('@') => (local, domain),
        _ => return Err(EmailFormatError::AtSymbol),
    };

    if local.is_empty()
        || local.len() > MAX_LOCAL_PART_LENGTH
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || !local.chars().all(is_local_char)
    {
        return Err(EmailFormatError::LocalPart);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let valid_domain = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LENGTH
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        // TLD cannot be all digits
        && labels
            .last()
            .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));
    if !valid_domain {
        return Err(EmailFormatError::Domain);
    }

    Ok(())
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c)
}

/// Domain part of an address that passed `validate_email_format`
pub fn email_domain(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, d)| d).unwrap_or(email)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliverabilityError {
    #[error("The domain name {0} does not accept email")]
    NoMailServer(String),
}

/// Decides whether a mail domain can receive email
#[async_trait]
pub trait MailDomainVerifier: Send + Sync {
    async fn verify(&self, domain: &str) -> Result<(), DeliverabilityError>;
}

/// Resolves MX records, falling back to A/AAAA as SMTP does
pub struct DnsMailDomainVerifier {
    resolver: TokioAsyncResolver,
}

impl DnsMailDomainVerifier {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for DnsMailDomainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

#[async_trait]
impl MailDomainVerifier for DnsMailDomainVerifier {
    async fn verify(&self, domain: &str) -> Result<(), DeliverabilityError> {
        // Fully qualified so the resolver does not append search domains
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        match self.resolver.mx_lookup(fqdn.as_str()).await {
            Ok(mx) => {
                // A lone "." exchange is a null MX: the domain explicitly refuses mail
                let accepts_mail = mx.iter().any(|record| !record.exchange().is_root());
                return if accepts_mail {
                    Ok(())
                } else {
                    Err(DeliverabilityError::NoMailServer(domain.to_string()))
                };
            }
            Err(e) if is_no_records(&e) => {}
            Err(e) => {
                tracing::warn!(domain = %domain, error = %e, "MX lookup failed, accepting address");
                return Ok(());
            }
        }

        match self.resolver.lookup_ip(fqdn.as_str()).await {
            Ok(ips) if ips.iter().next().is_some() => Ok(()),
            Ok(_) => Err(DeliverabilityError::NoMailServer(domain.to_string())),
            Err(e) if is_no_records(&e) => {
                Err(DeliverabilityError::NoMailServer(domain.to_string()))
            }
            Err(e) => {
                tracing::warn!(domain = %domain, error = %e, "Address lookup failed, accepting address");
                Ok(())
            }
        }
    }
}

/// Verifier used when deliverability checks are switched off
pub struct AcceptAllMailDomains;

#[async_trait]
impl MailDomainVerifier for AcceptAllMailDomains {
    async fn verify(&self, _domain: &str) -> Result<(), DeliverabilityError> {
        Ok(())
    }
}
