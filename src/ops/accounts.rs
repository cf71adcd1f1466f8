use crate::error::{Error, Result};
use crate::model::{User, UserSummary, UserType};
use crate::ops::present;
use crate::store::{Store, is_unique_violation};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct Signup {
    pub username: Option<String>,
    pub password: Option<String>,
    pub usertype: Option<String>,
    pub fullname: Option<String>,
}

pub async fn signup(store: &Store, request: Signup) -> Result<User> {
    let (Some(username), Some(password), Some(usertype), Some(fullname)) = (
        present(&request.username),
        present(&request.password),
        present(&request.usertype),
        present(&request.fullname),
    ) else {
        return Err(Error::validation("Missing required fields"));
    };
    let usertype = usertype
        .parse::<UserType>()
        .map_err(|()| Error::validation("Invalid usertype"))?;
    let password = hash_password(password)?;
    match store
        .insert_user(username, &password, usertype, fullname)
        .await
    {
        Ok(user) => {
            info!(user = %user.username, usertype = %user.usertype, "account created");
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => Err(Error::conflict("Username already taken")),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Signin {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn signin(store: &Store, request: Signin) -> Result<UserSummary> {
    let (Some(username), Some(password)) =
        (present(&request.username), present(&request.password))
    else {
        return Err(Error::validation("Username and password are required"));
    };
    let Some(user) = store.user_by_username(username).await? else {
        return Err(Error::Credentials);
    };
    if !verify_password(password, &user.password) {
        return Err(Error::Credentials);
    }
    info!(user = %user.username, "login");
    Ok(user.into())
}

pub async fn get_user(store: &Store, username: Option<String>) -> Result<User> {
    let Some(username) = present(&username) else {
        return Err(Error::validation("Username is required"));
    };
    store
        .user_by_username(username)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub batch: Option<i64>,
}

/// Overwrite the profile fields of the named account. The usertype never
/// changes, and projects keep the department snapshot they were created
/// with.
pub async fn update_profile(store: &Store, request: ProfileUpdate) -> Result<User> {
    let (Some(username), Some(fullname), Some(university), Some(department)) = (
        present(&request.username),
        present(&request.fullname),
        present(&request.university),
        present(&request.department),
    ) else {
        return Err(Error::validation("Missing required fields"));
    };
    let Some(user) = store.user_by_username(username).await? else {
        return Err(Error::not_found("User not found"));
    };
    if user.usertype == UserType::Student && request.batch.is_none() {
        return Err(Error::validation("Batch is required for students"));
    }
    let updated = store
        .update_profile(username, fullname, university, department, request.batch)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;
    info!(user = %updated.username, "profile updated");
    Ok(updated)
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Internal(eyre::eyre!("cannot encode salt: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(eyre::eyre!("cannot hash password: {e}")))
}

/// Verify against the stored PHC string. A row whose hash does not parse
/// counts as a failed login rather than an internal error.
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(error) => {
            warn!(%error, "stored password hash does not parse");
            false
        }
    }
}
