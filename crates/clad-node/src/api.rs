use crate::auth::AuthResolver;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use clad_engine::{OrderManager, RewardEngine};
use clad_types::{Result, RewardError, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RewardEngine>,
    pub orders: Arc<OrderManager>,
    pub auth: Arc<AuthResolver>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cooldown_remaining: Option<i64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: RewardError) -> ApiError {
    let status = match &e {
        RewardError::Unauthorized => StatusCode::UNAUTHORIZED,
        RewardError::Forbidden => StatusCode::FORBIDDEN,
        RewardError::CooldownActive { .. } | RewardError::DailyLimitReached => {
            StatusCode::TOO_MANY_REQUESTS
        }
        RewardError::AlreadyClaimed | RewardError::AlreadyProcessed => StatusCode::CONFLICT,
        RewardError::PartnerNotFound(_) | RewardError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        RewardError::InvalidBoostLevel(_)
        | RewardError::PartnerInactive(_)
        | RewardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        RewardError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let cooldown_remaining = match &e {
        RewardError::CooldownActive { remaining_seconds } => Some(*remaining_seconds),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            cooldown_remaining,
        }),
    )
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<UserId> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok());
    let user_id_header = headers.get("X-User-ID").and_then(|v| v.to_str().ok());
    let identity = state.auth.resolve(auth_header, user_id_header).await?;
    Ok(identity.user_id().clone())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user/init", post(init_user))
        .route("/user/balance", get(get_balance))
        .route("/ads/next", get(next_ad))
        .route("/ads/complete", post(complete_ad))
        .route("/orders/create", post(create_order))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/:order_id/confirm", post(confirm_order))
        .route("/stats", get(get_stats))
        .route("/rewards/status", get(reward_status))
        .route("/rewards/claim", post(claim_reward))
        .with_state(Arc::new(state))
}

pub fn start_api_server(state: AppState, host: &str, port: u16) -> JoinHandle<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    info!(addr = %addr, "📡 Starting API server");

    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind API server");
        axum::serve(listener, app).await.expect("API server failed");
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct InitUserResponse {
    user: UserSummary,
}

#[derive(Serialize)]
struct UserSummary {
    id: UserId,
    energy: u64,
    boost_level: u8,
    boost_expires_at: Option<DateTime<Utc>>,
}

async fn init_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> std::result::Result<Json<InitUserResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let account = state
        .engine
        .init_user(&user, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(InitUserResponse {
        user: UserSummary {
            id: account.id,
            energy: account.energy.units(),
            boost_level: account.boost_level,
            boost_expires_at: account.boost_expires_at,
        },
    }))
}

async fn get_balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> std::result::Result<Json<clad_engine::BalanceView>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let view = state
        .engine
        .balance(&user, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}

#[derive(Serialize)]
struct NextAdResponse {
    id: String,
    url: String,
    reward: u64,
    #[serde(rename = "type")]
    ad_type: String,
}

/// Ad-creative selection is an external concern; the service hands out a
/// static default placement.
async fn next_ad(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> std::result::Result<Json<NextAdResponse>, ApiError> {
    authorize(&state, &headers).await.map_err(error_response)?;
    Ok(Json(NextAdResponse {
        id: "default_ad".to_string(),
        url: String::new(),
        reward: state.engine.config().base_reward.units(),
        ad_type: "partner".to_string(),
    }))
}

#[derive(Deserialize)]
struct CompleteAdRequest {
    ad_id: String,
}

#[derive(Serialize)]
struct CompleteAdResponse {
    success: bool,
    reward: u64,
    new_balance: u64,
    multiplier: f64,
    daily_watches_remaining: u32,
    boost_level: u8,
    boost_expires_at: Option<DateTime<Utc>>,
    last_watch_at: DateTime<Utc>,
}

async fn complete_ad(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CompleteAdRequest>,
) -> std::result::Result<Json<CompleteAdResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let outcome = state
        .engine
        .award_ad_watch(&user, &req.ad_id, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(CompleteAdResponse {
        success: true,
        reward: outcome.reward.units(),
        new_balance: outcome.new_balance.units(),
        multiplier: outcome.multiplier,
        daily_watches_remaining: outcome.daily_remaining,
        boost_level: outcome.boost_level,
        boost_expires_at: outcome.boost_expires_at,
        last_watch_at: outcome.last_watch_at,
    }))
}

#[derive(Deserialize)]
struct CreateOrderRequest {
    boost_level: u8,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> std::result::Result<Json<clad_engine::OrderInvoice>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let invoice = state
        .orders
        .create_order(&user, req.boost_level, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(invoice))
}

#[derive(Serialize)]
struct OrderStatusResponse {
    order_id: String,
    status: clad_types::OrderStatus,
    boost_level: u8,
    ton_amount: f64,
    tx_hash: Option<String>,
    created_at: DateTime<Utc>,
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> std::result::Result<Json<OrderStatusResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let order = state
        .orders
        .get_order(&user, &order_id)
        .await
        .map_err(error_response)?;
    Ok(Json(OrderStatusResponse {
        order_id: order.id,
        status: order.status,
        boost_level: order.boost_level,
        ton_amount: order.ton_amount,
        tx_hash: order.tx_hash,
        created_at: order.created_at,
    }))
}

#[derive(Deserialize, Default)]
struct ConfirmOrderRequest {
    tx_hash: Option<String>,
}

#[derive(Serialize)]
struct ConfirmOrderResponse {
    success: bool,
    boost_level: u8,
    boost_expires_at: Option<DateTime<Utc>>,
    multiplier: f64,
}

async fn confirm_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    body: Option<Json<ConfirmOrderRequest>>,
) -> std::result::Result<Json<ConfirmOrderResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let activation = state
        .orders
        .confirm_order(&user, &order_id, req.tx_hash.as_deref(), Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ConfirmOrderResponse {
        success: true,
        boost_level: activation.boost_level,
        boost_expires_at: activation.boost_expires_at,
        multiplier: activation.multiplier,
    }))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> std::result::Result<Json<clad_engine::UserStats>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let stats = state
        .engine
        .stats(&user, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(stats))
}

#[derive(Serialize)]
struct RewardStatusResponse {
    claimed_partners: Vec<String>,
}

async fn reward_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> std::result::Result<Json<RewardStatusResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let claimed_partners = state
        .engine
        .reward_status(&user)
        .await
        .map_err(error_response)?;
    Ok(Json(RewardStatusResponse { claimed_partners }))
}

/// Only the partner id is read from the body. Anything else a client sends,
/// including a claimed reward amount, is ignored; amounts come from the
/// server-held registry.
#[derive(Deserialize)]
struct ClaimRewardRequest {
    partner_id: String,
}

#[derive(Serialize)]
struct ClaimRewardResponse {
    success: bool,
    reward: u64,
    new_balance: u64,
    partner_name: String,
}

async fn claim_reward(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ClaimRewardRequest>,
) -> std::result::Result<Json<ClaimRewardResponse>, ApiError> {
    let user = authorize(&state, &headers).await.map_err(error_response)?;
    let receipt = state
        .engine
        .claim_partner_reward(&user, &req.partner_id, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ClaimRewardResponse {
        success: true,
        reward: receipt.reward.units(),
        new_balance: receipt.new_balance.units(),
        partner_name: receipt.partner_name,
    }))
}
