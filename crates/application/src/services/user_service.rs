use std::sync::Arc;

use uuid::Uuid;

use domain::{DomainError, User, UserEmail, UserId, Username};

use crate::{
    clock::Clock,
    dto::UserDto,
    error::ApplicationError,
    password::PasswordHasher,
    repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub email: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserDto, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        if request.password.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let hashed = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::new(Uuid::new_v4()),
            username,
            email,
            hashed,
            self.deps.clock.now(),
        );

        let stored = self.deps.user_repository.create(user).await?;
        tracing::info!(user_id = %stored.id, "用户注册成功");
        Ok(UserDto::from(&stored))
    }

    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<UserDto, ApplicationError> {
        let email = UserEmail::parse(request.email)?;

        let user = self
            .deps
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !valid {
            return Err(DomainError::InvalidCredentials.into());
        }

        Ok(UserDto::from(&user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserDto, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId::from(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserDto::from(&user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserDto>, ApplicationError> {
        let users = self.deps.user_repository.list().await?;
        Ok(users.iter().map(UserDto::from).collect())
    }
}
