pub mod api;
pub mod clock;
pub mod database;

pub use api::*;
pub use clock::*;
pub use database::*;
