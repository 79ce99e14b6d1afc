//! Admin account creation and its public representation

use serde::Serialize;
use taptosmile_shared::{AdminAccount, AdminId, Role};
use time::OffsetDateTime;

use crate::{
    auth::{hash_password, validate_password},
    email_check::{email_domain, validate_email_format, MailDomainVerifier},
    error::{ApiError, ApiResult},
    store::CredentialStore,
};

/// Account as exposed over the API; the password hash never leaves the server
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: AdminId,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<AdminAccount> for AdminResponse {
    fn from(account: AdminAccount) -> Self {
        Self {
            id: account.id,
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Validated input for a new account
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Check an address that is about to be stored: syntax first, then
/// whether its domain can receive mail
pub async fn validate_new_email(
    mail_domains: &dyn MailDomainVerifier,
    email: &str,
) -> ApiResult<()> {
    validate_email_format(email)
        .map_err(|e| ApiError::validation(format!("Invalid email: {e}")))?;
    mail_domains
        .verify(email_domain(email))
        .await
        .map_err(|e| ApiError::validation(format!("Invalid email: {e}")))
}

/// Create an account after validating it and checking the email is free.
///
/// Authorization is the caller's job.
pub async fn create_account(
    store: &dyn CredentialStore,
    mail_domains: &dyn MailDomainVerifier,
    new: NewAccount,
) -> ApiResult<AdminAccount> {
    validate_new_email(mail_domains, &new.email).await?;
    validate_password(&new.password).map_err(|e| ApiError::validation(e.to_string()))?;

    // The unique constraint catches the race between this check and the insert
    if store.find_by_email(&new.email).await?.is_some() {
        return Err(ApiError::EmailAlreadyExists);
    }

    let account = AdminAccount::new(new.email, hash_password(&new.password)?, new.role);
    store.insert(account.clone()).await?;
    Ok(account)
}

/// Create the first superadmin of an empty installation.
///
/// Refused once any account exists; from then on accounts are created by
/// authenticated callers.
pub async fn bootstrap_superadmin(
    store: &dyn CredentialStore,
    mail_domains: &dyn MailDomainVerifier,
    email: String,
    password: String,
) -> ApiResult<AdminAccount> {
    if store.count().await? > 0 {
        return Err(ApiError::Forbidden(
            "Registration is closed: accounts already exist",
        ));
    }
    create_account(
        store,
        mail_domains,
        NewAccount {
            email,
            password,
            role: Role::Superadmin,
        },
    )
    .await
}
