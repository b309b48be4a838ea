//! Data types stored in, and returned from, the loyalty points database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use lpg_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The order number a user submits for a points accrual. Opaque and unique across the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, but not yet seen by the accrual service.
    New,
    /// The accrual service has the order, but has not decided on a reward yet.
    Processing,
    /// The accrual service has registered the order. The reward (if any) is final.
    #[serde(alias = "PROCESSED")]
    Registered,
    /// The accrual service rejected the order. No reward will be paid.
    Invalid,
}

impl OrderStatusType {
    /// Orders in a non-terminal state are still awaiting a reward decision and are picked up by the accrual pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Registered | Self::Invalid)
    }

    pub const NON_TERMINAL: [OrderStatusType; 2] = [OrderStatusType::New, OrderStatusType::Processing];
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Registered => write!(f, "REGISTERED"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to NEW");
            OrderStatusType::New
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "REGISTERED" | "PROCESSED" => Ok(Self::Registered),
            "INVALID" => Ok(Self::Invalid),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "number")]
    pub order_number: OrderNumber,
    #[serde(skip)]
    pub user_id: i64,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: i64,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, user_id: i64) -> Self {
        Self { order_number, user_id }
    }
}

//--------------------------------------    AccrualResult     ---------------------------------------------------------
/// The accrual service's verdict on an order, ready to be written back to the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualResult {
    pub order_number: OrderNumber,
    pub status: OrderStatusType,
    pub accrual: Option<Points>,
}

impl AccrualResult {
    /// The accrual is only retained for `REGISTERED` orders; any value reported alongside another status is dropped.
    pub fn new(order_number: OrderNumber, status: OrderStatusType, accrual: Option<Points>) -> Self {
        let accrual = match status {
            OrderStatusType::Registered => accrual,
            _ => None,
        };
        Self { order_number, status, accrual }
    }
}

//--------------------------------------      Withdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(rename = "order")]
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub sum: Points,
}

//--------------------------------------       Balance        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

impl Balance {
    pub fn new(accrued: Points, withdrawn: Points) -> Self {
        Self { current: accrued - withdrawn, withdrawn }
    }
}

//--------------------------------------   UserCredentials    ---------------------------------------------------------
#[derive(Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserCredentials {{ id: {}, login: {}, password_hash: **** }}", self.id, self.login)
    }
}
