//! Payment status reference table.
//!
//! The payments API reports one of eight statuses on a payment. This is
//! reference data for clients reading responses and redirect URLs; no
//! transitions are enforced here.

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCustomerAction,
    RequiresCapture,
    Processing,
    Succeeded,
    Failed,
    Expired,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 8] = [
        PaymentStatus::RequiresPaymentMethod,
        PaymentStatus::RequiresConfirmation,
        PaymentStatus::RequiresCustomerAction,
        PaymentStatus::RequiresCapture,
        PaymentStatus::Processing,
        PaymentStatus::Succeeded,
        PaymentStatus::Failed,
        PaymentStatus::Expired,
    ];

    pub fn description(self) -> &'static str {
        match self {
            PaymentStatus::RequiresPaymentMethod => {
                "The payment was created and is waiting for a payment method to be attached."
            }
            PaymentStatus::RequiresConfirmation => {
                "A payment method is attached and the payment is waiting to be confirmed."
            }
            PaymentStatus::RequiresCustomerAction => {
                "The customer must complete an additional step, such as 3DS authentication or a bank redirect."
            }
            PaymentStatus::RequiresCapture => {
                "The payment was authorized after successful customer action and is waiting for a manual capture."
            }
            PaymentStatus::Processing => {
                "The payment was submitted to the connector and the outcome is not yet known."
            }
            PaymentStatus::Succeeded => "The payment was captured successfully.",
            PaymentStatus::Failed => "The payment was declined or could not be completed.",
            PaymentStatus::Expired => {
                "The payment was not completed within its validity window and can no longer be confirmed."
            }
        }
    }

    /// No further status change is expected.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentStatus::Succeeded | PaymentStatus::Failed | PaymentStatus::Expired
        )
    }
}
