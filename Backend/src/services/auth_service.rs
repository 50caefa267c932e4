use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::*;

use crate::config::JwtConfig;
use crate::errors::{AppError, AppResult};
use crate::models::dto::{LoginResponse, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest};
use crate::models::users::{self, Role, UserStatus};
use crate::models::otp;
use crate::services::mailer::{self, Mailer};
use crate::utils::{jwt, password};

pub struct AuthService;

/// Email stocké et comparé en minuscules
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `Some(valeur)` seulement si la valeur est non vide
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn generate_otp_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

impl AuthService {
    /// Crée un compte USER (utilisé par /auth/register et /student/add-student)
    #[tracing::instrument(skip(db, request), fields(email = %request.email))]
    pub async fn register(db: &DatabaseConnection, request: &RegisterRequest) -> AppResult<users::Model> {
        let email = normalize_email(&request.email);

        // 1. Vérifier si l'utilisateur existe déjà
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        // 2. Hash le mot de passe
        let password_hash = password::hash_password(&request.password)?;

        // 3. Créer l'utilisateur
        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            firstname: Set(non_empty(&request.firstname)),
            lastname: Set(non_empty(&request.lastname)),
            email: Set(email),
            password_hash: Set(password_hash),
            roles: Set(users::encode_roles(&[Role::User])),
            is_active: Set(true),
            status: Set(UserStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| AppError::from_insert(e, "Email already exists"))?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    #[tracing::instrument(skip(db, config, password))]
    pub async fn login(
        db: &DatabaseConnection,
        config: &JwtConfig,
        email: &str,
        password: &str,
    ) -> AppResult<LoginResponse> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        // 1. Trouver l'utilisateur
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?
            .ok_or_else(invalid)?;

        // 2. Vérifier le mot de passe
        if !password::verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        // 3. Générer les tokens
        let access_token = jwt::generate_access_token(&user, config)?;
        let refresh_token = jwt::generate_refresh_token(user.id, config)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResponse {
            user_id: user.id,
            email: user.email.clone(),
            roles: user.role_list().iter().map(|r| r.as_str().to_string()).collect(),
            access_token,
            refresh_token,
        })
    }

    /// Utilisateur actif de la session (404 si supprimé, 403 si désactivé)
    pub async fn active_user(db: &DatabaseConnection, user_id: i32) -> AppResult<users::Model> {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }
        Ok(user)
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user_id: i32,
        request: &UpdateProfileRequest,
    ) -> AppResult<users::Model> {
        let user = Self::active_user(db, user_id).await?;
        let mut active: users::ActiveModel = user.into();

        if let Some(firstname) = non_empty(&request.firstname) {
            active.firstname = Set(Some(firstname));
        }
        if let Some(lastname) = non_empty(&request.lastname) {
            active.lastname = Set(Some(lastname));
        }
        if let Some(mobile) = non_empty(&request.mobile) {
            active.mobile = Set(Some(mobile));
        }
        if let Some(address) = non_empty(&request.address) {
            active.address = Set(Some(address));
        }
        if let Some(link) = non_empty(&request.profile_pic_link) {
            active.profile_pic_link = Set(Some(link));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        Ok(active.update(db).await?)
    }

    /// Échange un refresh token contre un nouvel access token
    pub async fn refresh(db: &DatabaseConnection, config: &JwtConfig, token: Option<&str>) -> AppResult<String> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("Refresh token is required".to_string()))?;

        let claims = jwt::verify_refresh_token(token, config)?;

        // le flag is_active n'est pas revérifié ici
        let user = users::Entity::find_by_id(claims.sub)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Forbidden("Invalid or expired token".to_string()))?;

        jwt::generate_access_token(&user, config)
    }

    /// Émet un nouveau code OTP (les précédents sont supprimés) et l'envoie par email
    #[tracing::instrument(skip(db, mailer))]
    pub async fn forgot_password(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        ttl_minutes: i64,
        email: &str,
    ) -> AppResult<()> {
        let email = normalize_email(email);

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(db)
            .await?;
        if user.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let code = generate_otp_code();
        let now = Utc::now().naive_utc();

        let txn = db.begin().await?;
        otp::Entity::delete_many()
            .filter(otp::Column::Email.eq(&email))
            .exec(&txn)
            .await?;
        otp::ActiveModel {
            email: Set(email.clone()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::minutes(ttl_minutes)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        mailer
            .send(&email, mailer::OTP_SUBJECT, &mailer::otp_email_body(&code, ttl_minutes))
            .await?;

        tracing::info!("OTP issued");
        Ok(())
    }

    /// Vérifie un code (email, code) non expiré
    pub async fn check_otp<C: ConnectionTrait>(db: &C, email: &str, code: &str) -> AppResult<otp::Model> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("OTP is required".to_string()));
        }

        let stored = otp::Entity::find()
            .filter(otp::Column::Email.eq(normalize_email(email)))
            .filter(otp::Column::Code.eq(code))
            .one(db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid OTP".to_string()))?;

        if stored.is_expired(Utc::now().naive_utc()) {
            return Err(AppError::Validation("OTP has expired".to_string()));
        }
        Ok(stored)
    }

    /// Reset du mot de passe avec un OTP valide, qui est ensuite consommé
    #[tracing::instrument(skip(db, request), fields(email = %request.email))]
    pub async fn reset_password(db: &DatabaseConnection, request: &ResetPasswordRequest) -> AppResult<()> {
        let email = normalize_email(&request.email);
        let txn = db.begin().await?;

        Self::check_otp(&txn, &email, &request.otp).await?;

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password::hash_password(&request.password)?);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await?;

        otp::Entity::delete_many()
            .filter(otp::Column::Email.eq(&email))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!("Password reset");
        Ok(())
    }

    /// Utilisateurs actifs ayant le rôle demandé
    pub async fn list_active_with_role(db: &DatabaseConnection, role: Role) -> AppResult<Vec<users::Model>> {
        let users = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?;

        Ok(users.into_iter().filter(|u| u.has_role(role)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, RecordingMailer, TEST_PASSWORD};

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            firstname: Some("Ada".to_string()),
            lastname: None,
        }
    }

    async fn latest_code(db: &DatabaseConnection, email: &str) -> String {
        otp::Entity::find()
            .filter(otp::Column::Email.eq(email))
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .code
    }

    #[tokio::test]
    async fn test_register_lowercases_email_and_rejects_duplicates() {
        let db = test_support::test_db().await;

        let user = AuthService::register(&db, &register_request("Ada@Example.COM")).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role_list(), vec![Role::User]);

        let duplicate = AuthService::register(&db, &register_request("ada@example.com")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_checks_password_and_activity() {
        let db = test_support::test_db().await;
        let config = test_support::test_config().jwt;
        let user = test_support::insert_user(&db, "ada@example.com", "USER").await;

        let response = AuthService::login(&db, &config, "ADA@example.com", TEST_PASSWORD).await.unwrap();
        assert_eq!(response.user_id, user.id);
        assert_eq!(jwt::verify_access_token(&response.access_token, &config).unwrap().sub, user.id);

        let wrong = AuthService::login(&db, &config, "ada@example.com", "nope").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let inactive = AuthService::login(&db, &config, "ada@example.com", TEST_PASSWORD).await;
        assert!(matches!(inactive, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_refresh_requires_token_and_existing_user() {
        let db = test_support::test_db().await;
        let config = test_support::test_config().jwt;
        let user = test_support::insert_user(&db, "ada@example.com", "USER").await;

        assert!(matches!(
            AuthService::refresh(&db, &config, None).await,
            Err(AppError::Validation(_))
        ));

        let refresh = jwt::generate_refresh_token(user.id, &config).unwrap();
        let access = AuthService::refresh(&db, &config, Some(&refresh)).await.unwrap();
        assert_eq!(jwt::verify_access_token(&access, &config).unwrap().sub, user.id);

        let ghost = jwt::generate_refresh_token(999, &config).unwrap();
        assert!(matches!(
            AuthService::refresh(&db, &config, Some(&ghost)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_ignores_empty_fields() {
        let db = test_support::test_db().await;
        let user = test_support::insert_user(&db, "ada@example.com", "USER").await;

        let request = UpdateProfileRequest {
            firstname: Some("  ".to_string()),
            mobile: Some("0600000000".to_string()),
            ..Default::default()
        };
        let updated = AuthService::update_profile(&db, user.id, &request).await.unwrap();

        assert_eq!(updated.firstname, user.firstname);
        assert_eq!(updated.mobile.as_deref(), Some("0600000000"));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let db = test_support::test_db().await;
        let mailer = RecordingMailer::default();

        let result = AuthService::forgot_password(&db, &mailer, 15, "ghost@example.com").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_latest_otp_verifies() {
        let db = test_support::test_db().await;
        let mailer = RecordingMailer::default();
        test_support::insert_user(&db, "ada@example.com", "USER").await;

        AuthService::forgot_password(&db, &mailer, 15, "ada@example.com").await.unwrap();
        let first = latest_code(&db, "ada@example.com").await;
        AuthService::forgot_password(&db, &mailer, 15, "ada@example.com").await.unwrap();
        let second = latest_code(&db, "ada@example.com").await;

        let count = otp::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 1);
        assert!(AuthService::check_otp(&db, "ada@example.com", &second).await.is_ok());
        if first != second {
            assert!(AuthService::check_otp(&db, "ada@example.com", &first).await.is_err());
        }

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, "ada@example.com");
        assert!(sent[1].body.contains(&second));
    }

    #[tokio::test]
    async fn test_expired_otp_does_not_verify() {
        let db = test_support::test_db().await;
        test_support::insert_otp(&db, "ada@example.com", "123456", -1).await;

        let result = AuthService::check_otp(&db, "ada@example.com", "123456").await;

        match result {
            Err(AppError::Validation(message)) => assert_eq!(message, "OTP has expired"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_password_consumes_otp() {
        let db = test_support::test_db().await;
        let config = test_support::test_config().jwt;
        test_support::insert_user(&db, "ada@example.com", "USER").await;
        test_support::insert_otp(&db, "ada@example.com", "123456", 15).await;

        let request = ResetPasswordRequest {
            email: "ada@example.com".to_string(),
            otp: "123456".to_string(),
            password: "brand-new-pass".to_string(),
        };
        AuthService::reset_password(&db, &request).await.unwrap();

        assert!(AuthService::login(&db, &config, "ada@example.com", "brand-new-pass").await.is_ok());
        assert_eq!(otp::Entity::find().count(&db).await.unwrap(), 0);

        // code consommé: un second reset échoue
        assert!(AuthService::reset_password(&db, &request).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_password_without_valid_otp_fails() {
        let db = test_support::test_db().await;
        let config = test_support::test_config().jwt;
        test_support::insert_user(&db, "ada@example.com", "USER").await;

        let request = ResetPasswordRequest {
            email: "ada@example.com".to_string(),
            otp: "000000".to_string(),
            password: "brand-new-pass".to_string(),
        };

        assert!(matches!(
            AuthService::reset_password(&db, &request).await,
            Err(AppError::Validation(_))
        ));
        assert!(AuthService::login(&db, &config, "ada@example.com", TEST_PASSWORD).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_active_with_role() {
        let db = test_support::test_db().await;
        test_support::insert_user(&db, "student@example.com", "STUDENT").await;
        let user = test_support::insert_user(&db, "user@example.com", "USER").await;
        let inactive = test_support::insert_user(&db, "old@example.com", "STUDENT").await;
        let mut active: users::ActiveModel = inactive.into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let students = AuthService::list_active_with_role(&db, Role::Student).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].email, "student@example.com");

        let users = AuthService::list_active_with_role(&db, Role::User).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![user.id]);
    }
}
