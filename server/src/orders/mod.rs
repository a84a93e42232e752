pub mod model;
pub mod routes;
pub mod snapshot;
pub mod status;
pub mod transition;

pub use model::{CustomerRef, Order, OrderItem, RestaurantRef};
pub use status::OrderStatus;
