//! Service layer for business logic
//!
//! Wires the store, the reconciler and the generative client into the
//! operations the phone screens call.

pub mod phone;
pub mod worldbook;

pub use phone::PhoneService;
pub use worldbook::WorldBookService;
