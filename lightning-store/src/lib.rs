#![deny(unsafe_code)]

mod action;
mod context;
pub mod model;
mod reducer;
mod state;

pub use self::{
    action::Action,
    context::StoreContext,
    model::{Invoice, User},
    reducer::transition,
    state::AppState,
};
