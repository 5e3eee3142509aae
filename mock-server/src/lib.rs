use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub mod observability;

pub const API_KEY_HEADER: &str = "api-key";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub client_secret: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub return_url: Option<String>,
    pub shipping: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub statement_descriptor_name: Option<String>,
    pub statement_descriptor_suffix: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePayment {
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub confirm: bool,
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePayment {
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub shipping: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub statement_descriptor_name: Option<String>,
    pub statement_descriptor_suffix: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<String, Payment>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/{id}", get(retrieve_payment).post(update_payment))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) if !key.is_empty() => Ok(()),
        _ => {
            tracing::warn!("rejected request without api key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn create_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<Payment>), StatusCode> {
    authorize(&headers)?;
    let payment_id = format!("pay_{}", Uuid::new_v4().simple());
    let payment = Payment {
        client_secret: format!("{payment_id}_secret_{}", Uuid::new_v4().simple()),
        payment_id,
        status: if input.confirm {
            "succeeded".to_string()
        } else {
            "requires_payment_method".to_string()
        },
        amount: input.amount,
        currency: input.currency,
        customer_id: input.customer_id,
        description: input.description,
        return_url: input.return_url,
        shipping: None,
        metadata: None,
        statement_descriptor_name: None,
        statement_descriptor_suffix: None,
    };
    tracing::info!(payment_id = %payment.payment_id, amount = payment.amount, "payment created");
    db.write()
        .await
        .insert(payment.payment_id.clone(), payment.clone());
    Ok((StatusCode::OK, Json(payment)))
}

async fn retrieve_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Payment>, StatusCode> {
    authorize(&headers)?;
    let payments = db.read().await;
    payments.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdatePayment>,
) -> Result<Json<Payment>, StatusCode> {
    authorize(&headers)?;
    let mut payments = db.write().await;
    let payment = payments.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(amount) = input.amount {
        payment.amount = amount;
    }
    if let Some(currency) = input.currency {
        payment.currency = currency;
    }
    if input.customer_id.is_some() {
        payment.customer_id = input.customer_id;
    }
    if input.description.is_some() {
        payment.description = input.description;
    }
    if input.shipping.is_some() {
        payment.shipping = input.shipping;
    }
    if input.metadata.is_some() {
        payment.metadata = input.metadata;
    }
    if input.statement_descriptor_name.is_some() {
        payment.statement_descriptor_name = input.statement_descriptor_name;
    }
    if input.statement_descriptor_suffix.is_some() {
        payment.statement_descriptor_suffix = input.statement_descriptor_suffix;
    }
    tracing::info!(payment_id = %id, amount = payment.amount, "payment updated");
    Ok(Json(payment.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_serializes_status_and_amount() {
        let payment = Payment {
            payment_id: "pay_1".to_string(),
            client_secret: "pay_1_secret_x".to_string(),
            status: "requires_payment_method".to_string(),
            amount: 6540,
            currency: "USD".to_string(),
            customer_id: None,
            description: None,
            return_url: None,
            shipping: None,
            metadata: None,
            statement_descriptor_name: None,
            statement_descriptor_suffix: None,
        };
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["payment_id"], "pay_1");
        assert_eq!(json["amount"], 6540);
        assert_eq!(json["status"], "requires_payment_method");
    }

    #[test]
    fn create_payment_defaults_confirm_to_false() {
        let input: CreatePayment =
            serde_json::from_str(r#"{"amount":6540,"currency":"USD"}"#).unwrap();
        assert!(!input.confirm);
        assert!(input.customer_id.is_none());
    }

    #[test]
    fn create_payment_rejects_missing_amount() {
        let result: Result<CreatePayment, _> = serde_json::from_str(r#"{"currency":"USD"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_payment_rejects_string_amount() {
        let result: Result<UpdatePayment, _> = serde_json::from_str(r#"{"amount":"20000"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_payment_all_fields_optional() {
        let input: UpdatePayment = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.amount.is_none());
        assert!(input.metadata.is_none());
    }

    #[test]
    fn authorize_requires_non_empty_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(authorize(&headers), Err(StatusCode::UNAUTHORIZED));
        headers.insert(API_KEY_HEADER, "".parse().unwrap());
        assert_eq!(authorize(&headers), Err(StatusCode::UNAUTHORIZED));
        headers.insert(API_KEY_HEADER, "snd_key".parse().unwrap());
        assert_eq!(authorize(&headers), Ok(()));
    }
}
