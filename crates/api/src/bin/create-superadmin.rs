//! Bootstrap the first superadmin account
//!
//! Only works against an empty admins table; once any account exists, new
//! accounts are created through the API by an authenticated admin.
//!
//! Usage:
//!   cargo run --bin create-superadmin -- admin@example.org
//!   cargo run --bin create-superadmin -- admin@example.org "password"
//!
//! Reads DATABASE_URL (and optionally CHECK_EMAIL_DELIVERABILITY) from the
//! environment or a .env file. Without a password argument it is read from
//! stdin so it does not show up in the process list.

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use taptosmile_api::{
    accounts::bootstrap_superadmin,
    email_check::{AcceptAllMailDomains, DnsMailDomainVerifier, MailDomainVerifier},
    store::PgCredentialStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let mut args = env::args().skip(1);
    let Some(email) = args.next() else {
        bail!("Usage: create-superadmin <email> [password]");
    };
    let password = match args.next() {
        Some(password) => password,
        None => {
            print!("Password for {email}: ");
            io::stdout().flush()?;
            let mut password = String::new();
            io::stdin().read_line(&mut password)?;
            password.trim().to_string()
        }
    };

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let check_deliverability = env::var("CHECK_EMAIL_DELIVERABILITY")
        .map(|v| v.trim() != "false")
        .unwrap_or(true);

    let pool = taptosmile_shared::create_pool(&database_url, 1)
        .await
        .context("Failed to connect to database")?;
    taptosmile_shared::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store = PgCredentialStore::new(pool);
    let mail_domains: Arc<dyn MailDomainVerifier> = if check_deliverability {
        Arc::new(DnsMailDomainVerifier::new())
    } else {
        Arc::new(AcceptAllMailDomains)
    };

    let account = bootstrap_superadmin(&store, mail_domains.as_ref(), email, password)
        .await
        .context("Failed to create superadmin")?;

    println!("Created superadmin {} ({})", account.email, account.id);
    Ok(())
}
