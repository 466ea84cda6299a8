//! Account commands.

use bazaar_client::Bazaar;
use bazaar_client::api::{LoginRequest, SignupRequest};
use bazaar_core::Email;
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandError, print_line};

const PASSWORD_VAR: &str = "BAZAAR_PASSWORD";

/// The account password, from stdin when asked, otherwise `BAZAAR_PASSWORD`.
pub async fn read_password(from_stdin: bool) -> Result<SecretString, CommandError> {
    let raw = if from_stdin {
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(CommandError::ReadPassword)?;
        Some(line)
    } else {
        std::env::var(PASSWORD_VAR).ok()
    };
    password_from(raw)
}

fn password_from(raw: Option<String>) -> Result<SecretString, CommandError> {
    let raw = raw.ok_or(CommandError::MissingPassword)?;
    let password = raw.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::MissingPassword);
    }
    Ok(SecretString::from(password.to_string()))
}

pub async fn login(
    bazaar: &Bazaar,
    email: Email,
    password: SecretString,
) -> Result<(), bazaar_client::ApiError> {
    let user = bazaar.auth().login(&LoginRequest::new(email, password)).await?;
    print_line(&format!("Signed in as {} ({})", user.name, user.role.as_str()));
    Ok(())
}

pub async fn signup(bazaar: &Bazaar, request: &SignupRequest) -> Result<(), bazaar_client::ApiError> {
    let user = bazaar.auth().signup(request).await?;
    print_line(&format!("Welcome, {}. Your account is waiting for approval.", user.name));
    if let Some(slug) = user.store_slug.as_deref() {
        print_line(&format!("Store page: {}", bazaar.stores().public_url(slug)));
    }
    Ok(())
}

pub fn logout(bazaar: &Bazaar) {
    bazaar.auth().logout();
    print_line("Signed out.");
}

pub fn whoami(bazaar: &Bazaar) -> Result<(), CommandError> {
    let session = bazaar.session().snapshot();
    let user = session.user().ok_or(CommandError::NotSignedIn)?;
    print_line(&format!("{} <{}>", user.name, user.email.as_deref().unwrap_or("no email")));
    print_line(&format!("Role: {}", user.role.as_str()));
    if let Some(store) = user.store_name.as_deref() {
        print_line(&format!("Store: {store}"));
    }
    Ok(())
}
