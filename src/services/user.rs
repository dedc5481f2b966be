use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, NewUser, User};
use crate::repositories::Repositories;
use crate::utils::password::{hash_password, verify_password};

pub struct UserService<'a> {
    repos: &'a Repositories,
}

impl<'a> UserService<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        UserService { repos }
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.repos.users.find_by_id(id).await
    }

    /// Emails are stored lower-cased and must be unique.
    pub async fn register(&self, req: &CreateUserRequest, bcrypt_cost: u32) -> AppResult<User> {
        let email = req.email.trim().to_lowercase();
        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = hash_password(&req.password, bcrypt_cost)?;
        let user = self
            .repos
            .users
            .create(NewUser {
                username: req.username.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .repos
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}
