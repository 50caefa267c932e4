// ============================================================================
// MODÈLE : OTP (reset password)
// ============================================================================
//
// Workflow:
//   1. User demande un reset via POST /api/v1/auth/forgot-password
//   2. Backend supprime les anciens codes de cet email
//   3. Backend génère un code à 6 chiffres, expire après OTP_TTL_MINUTES
//   4. Backend envoie le code par email
//   5. POST /api/v1/auth/check-otp vérifie (email, code, non expiré)
//   6. PUT /api/v1/auth/reset-password vérifie à nouveau puis supprime le code
//
// Points d'attention:
//   - Au plus un code valide par email
//   - L'email est stocké en minuscules
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub email: String,

    pub code: String,

    pub expires_at: DateTime,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired(&self, now: DateTime) -> bool {
        now >= self.expires_at
    }
}
