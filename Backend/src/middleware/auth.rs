use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::users::Role;
use crate::state::AppState;
use crate::utils::jwt;

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub roles: Vec<Role>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// 403 si aucun des rôles autorisés n'est porté par l'utilisateur
    pub fn require_any(&self, allowed: &[Role]) -> AppResult<()> {
        if allowed.iter().any(|role| self.has_role(*role)) {
            return Ok(());
        }

        let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        Err(AppError::Forbidden(format!(
            "Forbidden: Require {} role",
            names.join(" or ")
        )))
    }
}

fn authenticate(req: &HttpRequest) -> AppResult<AuthUser> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state is not registered".to_string()))?;

    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    // 2. Convertir le header en string
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 3. Extraire le token (format: "Bearer <token>")
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".to_string())
    })?;

    // 4. Vérifier le token JWT
    let claims = jwt::verify_access_token(token.trim(), &state.config.jwt)?;

    // 5. Créer et retourner AuthUser
    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        roles: claims.roles.iter().filter_map(|r| Role::parse(r)).collect(),
        firstname: claims.firstname,
        lastname: claims.lastname,
    })
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roles: Vec<Role>) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "a@b.c".to_string(),
            roles,
            firstname: None,
            lastname: None,
        }
    }

    #[test]
    fn test_require_any_accepts_one_matching_role() {
        let user = user_with(vec![Role::User]);
        assert!(user.require_any(&[Role::Admin, Role::User]).is_ok());
    }

    #[test]
    fn test_require_any_rejects_other_roles() {
        let user = user_with(vec![Role::Student]);
        match user.require_any(&[Role::Admin]) {
            Err(AppError::Forbidden(message)) => assert_eq!(message, "Forbidden: Require ADMIN role"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
