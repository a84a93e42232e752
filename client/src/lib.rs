//! Client session for the entrega realtime gateway.
//!
//! Keeps a local order list in sync from three inputs: the `pedidos`
//! snapshot pushed after identify, incremental `order-update` / `new-order`
//! frames, and a fixed-interval REST poll that replaces the whole list and
//! bounds the staleness of any missed push. The socket reconnects with a
//! fixed delay forever; the poll runs regardless of socket state.

pub mod normalize;
pub mod poll;
pub mod session;
pub mod store;

pub use normalize::{normalize_order, LocalCustomer, LocalItem, LocalOrder, LocalRestaurant};
pub use session::{ClientSession, SessionConfig};
pub use store::OrderStore;
