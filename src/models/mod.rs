pub mod stock;
pub mod market;
pub mod summary;
pub mod response;

pub use stock::*;
pub use market::*;
pub use summary::*;
pub use response::*;
