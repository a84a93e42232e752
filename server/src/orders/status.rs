use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Transitions move monotonically forward, except that `Cancelled` is
/// reachable from any non-terminal state. `Delivered` and `Cancelled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "out_for_delivery" => Some(Self::OutForDelivery),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Active orders are the ones a merchant still has to act on; they are
    /// the contents of the `pedidos` snapshot.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether a transition from `self` to `next` is allowed:
    ///
    /// ```text
    /// Pending        -> Preparing | Cancelled
    /// Preparing      -> OutForDelivery | Cancelled
    /// OutForDelivery -> Delivered | Cancelled
    /// Delivered      -> (terminal)
    /// Cancelled      -> (terminal)
    /// ```
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Preparing)
            | (Self::Preparing, Self::OutForDelivery)
            | (Self::OutForDelivery, Self::Delivered) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}
