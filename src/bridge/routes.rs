use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::AckPolicy;
use crate::error::ItemError;
use crate::model::{WishlistItem, WishlistSummary};
use crate::owner::StoreHandle;
use crate::store::{MutationOutcome, StoreCommand};

pub const LIST_ROUTE: &str = "/getWishlists";
pub const ADD_ITEM_ROUTE: &str = "/addItem";

const ITEM_ADDED_MESSAGE: &str = "Item added successfully";
const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

#[derive(Clone)]
pub(crate) struct BridgeState {
    pub(crate) store: StoreHandle,
    pub(crate) ack: AckPolicy,
}

pub(crate) fn router(state: BridgeState) -> Router {
    Router::new()
        .route(
            LIST_ROUTE,
            get(list_wishlists_handler)
                .fallback(method_not_allowed)
                .layer(cors_policy([Method::GET, Method::OPTIONS])),
        )
        .route(
            ADD_ITEM_ROUTE,
            post(add_item_handler)
                .fallback(method_not_allowed)
                .layer(cors_policy([Method::POST, Method::OPTIONS])),
        )
        .fallback(not_found)
        .with_state(state)
}

/// Allow-all origin policy. The caller is a browser extension whose origin
/// cannot be known ahead of time. `OPTIONS` is answered here and never
/// reaches a handler.
fn cors_policy<const N: usize>(methods: [Method; N]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
}

async fn list_wishlists_handler(State(state): State<BridgeState>) -> Json<Vec<WishlistSummary>> {
    Json(state.store.snapshot().summaries())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    wishlist_id: Uuid,
    name: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Error)]
enum AddItemRejection {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Item(#[from] ItemError),
}

fn decode_add_item(body: &[u8]) -> Result<(Uuid, WishlistItem), AddItemRejection> {
    let request: AddItemRequest = serde_json::from_slice(body)?;
    let item = WishlistItem::new(
        request.name,
        request.link.unwrap_or_default(),
        request.notes.unwrap_or_default(),
    )?;
    Ok((request.wishlist_id, item))
}

async fn add_item_handler(State(state): State<BridgeState>, body: Bytes) -> Response {
    let (wishlist_id, item) = match decode_add_item(&body) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("[wishcraft:http] Error decoding item: {err}");
            return (StatusCode::BAD_REQUEST, format!("Decoding error: {err}")).into_response();
        }
    };

    info!(
        "[wishcraft:http] Adding \"{}\" to wishlist {wishlist_id}",
        item.name()
    );
    let command = StoreCommand::AddItem { wishlist_id, item };

    match state.ack {
        AckPolicy::Scheduled => {
            if let Err(err) = state.store.submit(command) {
                error!("[wishcraft:http] Failed to queue item: {err}");
                return store_unavailable();
            }
        }
        AckPolicy::Persisted => match state.store.apply(command).await {
            Ok(MutationOutcome::Unsaved) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, "Item could not be saved")
                    .into_response();
            }
            Ok(_) => {}
            Err(err) => {
                error!("[wishcraft:http] Failed to apply item: {err}");
                return store_unavailable();
            }
        },
    }

    (StatusCode::OK, ITEM_ADDED_MESSAGE).into_response()
}

fn store_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Wishlist store unavailable").into_response()
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE).into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        "Not Found",
    )
        .into_response()
}
