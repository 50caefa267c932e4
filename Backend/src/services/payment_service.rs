use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::*;

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::CreatePaymentRequest;
use crate::models::payment::{self, PaymentMethod, PaymentStatus};
use crate::models::users::Role;
use crate::services::auth_service::non_empty;

pub struct PaymentService;

impl PaymentService {
    /// Enregistre un paiement terminé pour l'utilisateur de la session
    #[tracing::instrument(skip(db, request))]
    pub async fn create(
        db: &DatabaseConnection,
        user_id: i32,
        request: &CreatePaymentRequest,
    ) -> AppResult<payment::Model> {
        if request.user_id.is_some_and(|body_user| body_user != user_id) {
            return Err(AppError::Forbidden("Cannot create a payment for another user".to_string()));
        }

        let transaction_id = non_empty(&request.transaction_id)
            .ok_or_else(|| AppError::Validation("transactionID is required".to_string()))?;
        let amount = request
            .amount
            .ok_or_else(|| AppError::Validation("amount is required".to_string()))?;
        if amount < Decimal::ZERO {
            return Err(AppError::Validation("Amount must be >= 0".to_string()));
        }

        let method = match non_empty(&request.payment_method) {
            Some(raw) => PaymentMethod::parse(&raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid payment method: {}", raw)))?,
            None => PaymentMethod::CreditCard,
        };

        let created = payment::ActiveModel {
            user_id: Set(user_id),
            order_id: Set(None),
            transaction_id: Set(transaction_id),
            payment_status: Set(PaymentStatus::Completed),
            amount: Set(amount),
            payment_method: Set(method.as_str().to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(payment_id = created.id, %amount, "Payment recorded");
        Ok(created)
    }

    /// ADMIN: tous les paiements, sinon ceux de l'utilisateur
    pub async fn list(db: &DatabaseConnection, auth_user: &AuthUser) -> AppResult<Vec<payment::Model>> {
        let mut query = payment::Entity::find().order_by_asc(payment::Column::Id);
        if !auth_user.has_role(Role::Admin) {
            query = query.filter(payment::Column::UserId.eq(auth_user.user_id));
        }
        Ok(query.all(db).await?)
    }
}
