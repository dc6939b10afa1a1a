use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
        password::{generate_salt, generate_token, hash_password, verify_password},
        repo::InsertUserError,
        repo_types::User,
    },
    error::AppError,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_EMAIL_LEN: usize = 50;

const EMAIL_USED: &str = "Email already used";
const BAD_CREDENTIALS: &str = "Email or password is incorrect";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Bounds checks that need no store access. Email is expected normalized.
pub(crate) fn validate_signup(req: &SignupRequest) -> Result<bool, AppError> {
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Missing parameters"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if req.username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation(
            "Username must be less than 30 characters",
        ));
    }
    if req.email.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::validation(
            "Email must be less than 50 characters",
        ));
    }
    if req.username.contains('\0') {
        return Err(AppError::validation("Username is not valid"));
    }
    if req.email.contains('\0') || !is_valid_email(&req.email) {
        return Err(AppError::validation("Email is not valid"));
    }
    req.newsletter
        .ok_or_else(|| AppError::validation("Newsletter must be a boolean"))
}

pub async fn signup(st: &AppState, mut req: SignupRequest) -> Result<SignupResponse, AppError> {
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();
    let newsletter = validate_signup(&req).inspect_err(|e| warn!(reason = %e, "signup rejected"))?;

    if st
        .users
        .find_by_email(&req.email)
        .await
        .map_err(AppError::upstream)?
        .is_some()
    {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::validation(EMAIL_USED));
    }

    let salt = generate_salt();
    let password = hash_password(&req.password, &salt)?;
    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        username: req.username,
        avatar: None,
        newsletter,
        password,
        salt,
        token: generate_token(),
        created_at: OffsetDateTime::now_utc(),
    };

    match st.users.insert(&user).await {
        Ok(()) => {}
        Err(InsertUserError::DuplicateEmail) => {
            warn!(email = %user.email, "email registered concurrently");
            return Err(AppError::validation(EMAIL_USED));
        }
        Err(InsertUserError::Store(e)) => return Err(AppError::upstream(e)),
    }

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(SignupResponse {
        id: user.id,
        account: user.account(),
        email: user.email,
        token: user.token,
        newsletter: user.newsletter,
    })
}

pub async fn login(st: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let email = req.email.trim().to_lowercase();
    if email.contains('\0') {
        warn!("login email with NUL");
        return Err(AppError::validation(BAD_CREDENTIALS));
    }

    let Some(user) = st
        .users
        .find_by_email(&email)
        .await
        .map_err(AppError::upstream)?
    else {
        warn!(%email, "login unknown email");
        return Err(AppError::validation(BAD_CREDENTIALS));
    };

    if !verify_password(&req.password, &user.password)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::validation(BAD_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        id: user.id,
        account: user.account(),
        token: user.token,
    })
}
