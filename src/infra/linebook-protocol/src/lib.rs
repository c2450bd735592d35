mod error;
mod query;
mod record;
mod role;
mod view;

pub use error::*;
pub use query::*;
pub use record::*;
pub use role::*;
pub use view::*;
