pub mod access;
pub mod deposit;
pub mod entities;
pub mod errors;
pub mod filters;
pub mod guard;
pub mod reporting;
pub mod settlement;

pub use access::*;
pub use deposit::*;
pub use entities::*;
pub use errors::*;
pub use filters::*;
pub use guard::*;
pub use reporting::*;
pub use settlement::*;
