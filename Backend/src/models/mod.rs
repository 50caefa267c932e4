// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Comptes (rôles, profil, activation)
//   - otp : Codes de reset password (expire 15 min)
//   - instructor : Formateurs + compteurs (cours, étudiants)
//   - course : Catalogue des cours
//   - course_video / course_resource : Listes ordonnées d'un cours
//   - cart_item : Panier (unique par user/cours)
//   - payment : Paiements enregistrés avant la commande
//   - order / order_item : Commandes et lignes (prix figé)
//   - student_course : Inscriptions
//   - dto : Data Transfer Objects pour l'API
//   - forms : Formulaires multipart (upload d'images)
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les relations entre tables sont définies dans chaque modèle
//   - L'ordre de création des tables est fixé dans db.rs
//
// ============================================================================

pub mod health;
pub mod users;
pub mod otp;
pub mod instructor;
pub mod course;
pub mod course_video;
pub mod course_resource;
pub mod cart_item;
pub mod payment;
pub mod order;
pub mod order_item;
pub mod student_course;
pub mod dto;
pub mod forms;
