use actix_web::{get, web, HttpResponse};
use chrono::Utc;

use crate::models::health::HealthResponse;
use crate::state::AppState;

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let now = Utc::now();
    let response = HealthResponse {
        status: "ok".to_string(),
        uptime_secs: (now - state.started_at).num_seconds(),
        time: now,
    };

    HttpResponse::Ok().json(response)
}
