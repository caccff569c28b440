//! Game economy endpoints
//!
//! ## Routes
//!
//! - `GET  /api/game/{userId}` - get state (creates the default document
//!   for an unseen user)
//! - `POST /api/game/{userId}/buy-bee` - buy a bee with flowers
//! - `POST /api/game/{userId}/sell-honey` - convert honey to rewards
//! - `POST /api/game/{userId}/upgrade-alveole` - unlock a storage tier
//! - `POST /api/game/{userId}/spin-roulette` - spend a ticket on the wheel
//! - `POST /api/game/{userId}/claim-mission` - claim a referral mission
//! - `POST /api/game/{userId}/add-test-resources` - dev mode only
//!
//! Every successful POST returns the full updated state alongside any
//! operation-specific payload. Rejections carry a stable `code` and map to
//! 404 (unknown user), 400 (invalid input / unknown entity / failed
//! precondition), or 500 (persistence).

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::schemas::EconomyDoc;
use crate::economy::catalog::PrizeReward;
use crate::economy::{
    AlveoleLevel, BeeTier, EconomyError, Rejection, RejectionClass, ResourceDeltas, SaleReceipt,
    SpinOutcome,
};
use crate::routes::{json_response, parse_json_body, ErrorResponse};
use crate::server::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyBeeRequest {
    bee_type_id: String,
}

#[derive(Debug, Deserialize)]
struct SellHoneyRequest {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct UpgradeAlveoleRequest {
    level: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimMissionRequest {
    mission_id: u32,
}

/// Wire view of a user's economy state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub user_id: String,
    pub honey: i64,
    pub flowers: i64,
    pub diamonds: i64,
    pub tickets: i64,
    pub secondary_coin: i64,
    pub bees: BTreeMap<BeeTier, i64>,
    pub alveoles: BTreeMap<AlveoleLevel, bool>,
    pub invited_friends: i64,
    pub claimed_missions: Vec<u32>,
    pub lifetime_diamonds_this_period: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl From<EconomyDoc> for GameStateView {
    fn from(doc: EconomyDoc) -> Self {
        Self {
            user_id: doc.user_id,
            honey: doc.honey,
            flowers: doc.flowers,
            diamonds: doc.diamonds,
            tickets: doc.tickets,
            secondary_coin: doc.secondary_coin,
            bees: doc.bee_counts,
            alveoles: doc.unlocked_alveoles,
            invited_friends: doc.invited_friends,
            claimed_missions: doc.claimed_mission_ids,
            lifetime_diamonds_this_period: doc.lifetime_diamonds_this_period,
            period_start: doc.period_start.map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            last_updated: doc.last_updated.map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    game_state: GameStateView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SellEnvelope {
    success: bool,
    message: String,
    rewards: SaleReceipt,
    game_state: GameStateView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpinEnvelope {
    success: bool,
    prize: PrizeView,
    game_state: GameStateView,
}

/// Prize descriptor for the client-side reveal animation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrizeView {
    /// Winning slot index in wheel order
    index: usize,
    label: &'static str,
    reward: PrizeReward,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MissionEnvelope {
    success: bool,
    message: String,
    flowers_reward: i64,
    tickets_reward: i64,
    game_state: GameStateView,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn rejection_response(rejection: &Rejection) -> Response<Full<Bytes>> {
    let status = match rejection.kind.class() {
        RejectionClass::NotFound => StatusCode::NOT_FOUND,
        RejectionClass::InvalidInput
        | RejectionClass::UnknownEntity
        | RejectionClass::PreconditionFailed => StatusCode::BAD_REQUEST,
    };

    json_response(
        status,
        &ErrorResponse::new(rejection.message.clone(), Some(rejection.kind.code())),
    )
}

fn economy_error_response(err: EconomyError) -> Response<Full<Bytes>> {
    match err {
        EconomyError::Rejected(rejection) => rejection_response(&rejection),
        EconomyError::Persistence(e) => {
            error!("Persistence failure: {}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse::new("Storage unavailable, retry shortly", Some("PERSISTENCE")),
            )
        }
    }
}

fn bad_body_response(e: crate::types::ApiaryError) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &ErrorResponse::new(format!("Invalid request body: {}", e), Some("BAD_BODY")),
    )
}

// =============================================================================
// Routing
// =============================================================================

/// Parsed game route components
#[derive(Debug)]
struct GameRoute<'a> {
    user_id: &'a str,
    /// Transition action, absent for the plain state read
    action: Option<&'a str>,
}

impl<'a> GameRoute<'a> {
    /// Parse "/api/game/{userId}" or "/api/game/{userId}/{action}"
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/game/")?;
        let parts: Vec<&str> = stripped.splitn(2, '/').collect();

        if parts.is_empty() || parts[0].is_empty() {
            return None;
        }

        Some(Self {
            user_id: parts[0],
            action: parts.get(1).copied().filter(|s| !s.is_empty()),
        })
    }
}

/// Handle a request under `/api/game/`. Returns `None` for paths/methods
/// that don't match a known route (the server maps that to 404).
pub async fn handle_game_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let route = GameRoute::parse(&path)?;
    let user_id = route.user_id.to_string();

    match (method, route.action) {
        (Method::GET, None) => Some(handle_get_state(state, &user_id).await),
        (Method::POST, Some("buy-bee")) => Some(handle_buy_bee(req, state, &user_id).await),
        (Method::POST, Some("sell-honey")) => Some(handle_sell_honey(req, state, &user_id).await),
        (Method::POST, Some("upgrade-alveole")) => {
            Some(handle_upgrade_alveole(req, state, &user_id).await)
        }
        (Method::POST, Some("spin-roulette")) => Some(handle_spin_roulette(state, &user_id).await),
        (Method::POST, Some("claim-mission")) => {
            Some(handle_claim_mission(req, state, &user_id).await)
        }
        (Method::POST, Some("add-test-resources")) if state.args.dev_mode => {
            Some(handle_add_test_resources(req, state, &user_id).await)
        }
        _ => None,
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_get_state(state: Arc<AppState>, user_id: &str) -> Response<Full<Bytes>> {
    match state.engine.get_or_create(user_id).await {
        Ok(doc) => json_response(
            StatusCode::OK,
            &StateEnvelope {
                success: true,
                message: None,
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

async fn handle_buy_bee(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: BuyBeeRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_body_response(e),
    };

    match state.engine.purchase_bee(user_id, &body.bee_type_id).await {
        Ok(doc) => json_response(
            StatusCode::OK,
            &StateEnvelope {
                success: true,
                message: Some(format!("Successfully purchased {} bee", body.bee_type_id)),
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

async fn handle_sell_honey(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: SellHoneyRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_body_response(e),
    };

    match state.engine.sell_honey(user_id, body.amount).await {
        Ok((doc, rewards)) => json_response(
            StatusCode::OK,
            &SellEnvelope {
                success: true,
                message: format!("Successfully sold {} honey", body.amount),
                rewards,
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

async fn handle_upgrade_alveole(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: UpgradeAlveoleRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_body_response(e),
    };

    match state.engine.unlock_alveole(user_id, body.level).await {
        Ok((doc, _tier)) => json_response(
            StatusCode::OK,
            &StateEnvelope {
                success: true,
                message: Some(format!("Alveole level {} unlocked", body.level)),
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

async fn handle_spin_roulette(state: Arc<AppState>, user_id: &str) -> Response<Full<Bytes>> {
    match state.engine.spin_roulette(user_id).await {
        Ok((doc, SpinOutcome { index, prize })) => json_response(
            StatusCode::OK,
            &SpinEnvelope {
                success: true,
                prize: PrizeView {
                    index,
                    label: prize.label,
                    reward: prize.reward,
                },
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

async fn handle_claim_mission(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: ClaimMissionRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_body_response(e),
    };

    match state.engine.claim_mission(user_id, body.mission_id).await {
        Ok((doc, mission)) => {
            // Best-effort ops notification, never coupled to the claim
            state.notifier.mission_claimed(
                user_id,
                mission.id,
                mission.flowers_reward,
                mission.tickets_reward,
            );

            json_response(
                StatusCode::OK,
                &MissionEnvelope {
                    success: true,
                    message: format!("Mission {} claimed", mission.id),
                    flowers_reward: mission.flowers_reward,
                    tickets_reward: mission.tickets_reward,
                    game_state: doc.into(),
                },
            )
        }
        Err(e) => economy_error_response(e),
    }
}

async fn handle_add_test_resources(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let deltas: ResourceDeltas = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return bad_body_response(e),
    };

    match state.engine.grant_test_resources(user_id, deltas).await {
        Ok(doc) => json_response(
            StatusCode::OK,
            &StateEnvelope {
                success: true,
                message: Some("Test resources granted".to_string()),
                game_state: doc.into(),
            },
        ),
        Err(e) => economy_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_route_parse() {
        let route = GameRoute::parse("/api/game/user-42").unwrap();
        assert_eq!(route.user_id, "user-42");
        assert_eq!(route.action, None);

        let route = GameRoute::parse("/api/game/user-42/buy-bee").unwrap();
        assert_eq!(route.user_id, "user-42");
        assert_eq!(route.action, Some("buy-bee"));

        // Trailing slash means no action
        let route = GameRoute::parse("/api/game/user-42/").unwrap();
        assert_eq!(route.action, None);

        assert!(GameRoute::parse("/api/game/").is_none());
        assert!(GameRoute::parse("/api/other/user-42").is_none());
    }

    #[test]
    fn test_state_view_wire_names() {
        let mut doc = EconomyDoc::new("user-42");
        doc.secondary_coin = 7;
        doc.bee_counts.insert(BeeTier::Worker, 3);
        doc.lifetime_diamonds_this_period = 12;

        let view: GameStateView = doc.into();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["userId"], "user-42");
        assert_eq!(json["secondaryCoin"], 7);
        assert_eq!(json["bees"]["worker"], 3);
        assert_eq!(json["alveoles"]["1"], true);
        assert_eq!(json["lifetimeDiamondsThisPeriod"], 12);
        assert!(json.get("claimedMissions").is_some());
        assert!(json.get("invitedFriends").is_some());
    }

    #[test]
    fn test_rejection_status_mapping() {
        use crate::economy::RejectionKind;

        let not_found = Rejection {
            kind: RejectionKind::UserNotFound,
            message: "no user".to_string(),
        };
        assert_eq!(rejection_response(&not_found).status(), StatusCode::NOT_FOUND);

        let precondition = Rejection {
            kind: RejectionKind::InsufficientFunds,
            message: "broke".to_string(),
        };
        assert_eq!(
            rejection_response(&precondition).status(),
            StatusCode::BAD_REQUEST
        );

        let invalid = Rejection {
            kind: RejectionKind::InvalidAmount,
            message: "too small".to_string(),
        };
        assert_eq!(rejection_response(&invalid).status(), StatusCode::BAD_REQUEST);
    }
}
