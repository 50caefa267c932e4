// ============================================================================
// SERVICE : CHECKOUT (finalisation de commande)
// ============================================================================
//
// Description:
//   Transforme un paiement enregistré + une liste de cours en commande:
//   Order, OrderItems (prix figé), inscriptions, compteurs, nettoyage du panier.
//
// Workflow (une seule transaction):
//   1. Contrôles: doublons, paiement (existe, appartient à l'utilisateur,
//      pas encore lié), cours déjà achetés, total recalculé côté serveur
//   2. Création de l'Order
//   3. Liaison du paiement à la commande (seulement si order_id IS NULL)
//   4. Pour chaque cours, dans l'ordre: OrderItem, inscription, compteurs
//   5. Suppression des cours achetés du panier
//   6. Commit
//
// Points d'attention:
//   - Un cours absent du catalogue est facturé 0 et reste traité
//   - Compteurs mis à jour par `col = col + 1` (pas de lecture/écriture)
//   - Toute erreur annule la transaction (rollback au drop)
//
// ============================================================================

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::errors::{AppError, AppResult};
use crate::models::dto::CreateOrderRequest;
use crate::models::{cart_item, course, instructor, order, order_item, payment, student_course};

/// Commande validée, prête à être finalisée
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub user_id: i32,
    pub payment_id: i32,
    pub course_ids: Vec<i32>,
    pub asserted_total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: i32,
    pub payment_id: i32,
}

pub struct CheckoutService;

impl CheckoutService {
    /// Champs obligatoires + cohérence avec l'utilisateur de la session
    pub fn validate(session_user_id: i32, body: &CreateOrderRequest) -> AppResult<CheckoutRequest> {
        let user_id = body
            .user_id
            .ok_or_else(|| AppError::Validation("userID is required".to_string()))?;
        let payment_id = body
            .payment_id
            .ok_or_else(|| AppError::Validation("paymentID is required".to_string()))?;
        let course_ids = body
            .course_ids
            .clone()
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| AppError::Validation("courseIDs must be a non-empty list".to_string()))?;
        let asserted_total = body
            .amount
            .ok_or_else(|| AppError::Validation("amount is required".to_string()))?;

        if user_id != session_user_id {
            return Err(AppError::Forbidden("Cannot create an order for another user".to_string()));
        }

        Ok(CheckoutRequest {
            user_id,
            payment_id,
            course_ids,
            asserted_total,
        })
    }

    #[tracing::instrument(
        skip(db, request),
        fields(user_id = request.user_id, payment_id = request.payment_id, courses = request.course_ids.len())
    )]
    pub async fn finalize_order(db: &DatabaseConnection, request: &CheckoutRequest) -> AppResult<CheckoutReceipt> {
        let txn = db.begin().await?;
        let receipt = Self::finalize_in(&txn, request).await?;
        txn.commit().await?;

        tracing::info!(order_id = receipt.order_id, "Order finalized");
        Ok(receipt)
    }

    async fn finalize_in(txn: &DatabaseTransaction, request: &CheckoutRequest) -> AppResult<CheckoutReceipt> {
        let user_id = request.user_id;
        let payment_id = request.payment_id;
        let course_ids = &request.course_ids;

        // 1. Doublons dans la requête
        let mut seen = HashSet::with_capacity(course_ids.len());
        if let Some(duplicate) = course_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::Validation(format!("Duplicate course ID in order: {}", duplicate)));
        }

        // 2. Paiement
        let payment = payment::Entity::find_by_id(payment_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if payment.user_id != user_id {
            return Err(AppError::Forbidden("Payment belongs to another user".to_string()));
        }
        if payment.order_id.is_some() {
            return Err(AppError::Conflict("Payment is already linked to an order".to_string()));
        }

        // 3. Catalogue (cours manquant = prix 0)
        let courses: HashMap<i32, course::Model> = course::Entity::find()
            .filter(course::Column::Id.is_in(course_ids.clone()))
            .all(txn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        for id in course_ids {
            if !courses.contains_key(id) {
                tracing::warn!(course_id = id, "Course not in catalog, priced at 0");
            }
        }

        // 4. Déjà inscrit
        let mut enrolled: Vec<i32> = student_course::Entity::find()
            .filter(student_course::Column::UserId.eq(user_id))
            .filter(student_course::Column::CourseId.is_in(course_ids.clone()))
            .all(txn)
            .await?
            .into_iter()
            .map(|e| e.course_id)
            .collect();
        if !enrolled.is_empty() {
            enrolled.sort_unstable();
            let list: Vec<String> = enrolled.iter().map(i32::to_string).collect();
            return Err(AppError::Conflict(format!(
                "Already enrolled in course(s): {}",
                list.join(", ")
            )));
        }

        // 5. Total recalculé
        let price_of = |id: &i32| courses.get(id).map(|c| c.price).unwrap_or(Decimal::ZERO);
        let total: Decimal = course_ids.iter().map(price_of).sum();
        if total.round_dp(2) != request.asserted_total.round_dp(2) {
            return Err(AppError::Validation(format!(
                "Order total mismatch: expected {}, got {}",
                total, request.asserted_total
            )));
        }

        // 6. Commande
        let now = Utc::now().naive_utc();
        let created = order::ActiveModel {
            user_id: Set(user_id),
            payment_id: Set(payment_id),
            total_amount: Set(total),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        // 7. Liaison du paiement, seulement s'il est encore libre
        let linked = payment::Entity::update_many()
            .col_expr(payment::Column::OrderId, Expr::value(created.id))
            .filter(payment::Column::Id.eq(payment_id))
            .filter(payment::Column::OrderId.is_null())
            .exec(txn)
            .await?;
        if linked.rows_affected != 1 {
            return Err(AppError::Conflict("Payment is already linked to an order".to_string()));
        }

        // 8. Lignes, inscriptions et compteurs
        for course_id in course_ids {
            order_item::ActiveModel {
                order_id: Set(created.id),
                course_id: Set(*course_id),
                price: Set(price_of(course_id)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            student_course::ActiveModel {
                user_id: Set(user_id),
                course_id: Set(*course_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|e| AppError::from_insert(e, "Already enrolled in this course"))?;

            if let Some(course) = courses.get(course_id) {
                course::Entity::update_many()
                    .col_expr(course::Column::Students, Expr::col(course::Column::Students).add(1))
                    .filter(course::Column::Id.eq(course.id))
                    .exec(txn)
                    .await?;

                instructor::Entity::update_many()
                    .col_expr(
                        instructor::Column::Students,
                        Expr::col(instructor::Column::Students).add(1),
                    )
                    .filter(instructor::Column::Id.eq(course.instructor_id))
                    .exec(txn)
                    .await?;
            }
        }

        // 9. Panier
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::CourseId.is_in(course_ids.clone()))
            .exec(txn)
            .await?;

        Ok(CheckoutReceipt {
            order_id: created.id,
            payment_id,
        })
    }
}
