pub mod futures;
pub mod response;
pub mod table;

pub use futures::*;
pub use response::*;
pub use table::*;
