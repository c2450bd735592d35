mod book;
mod migration;
mod phone;
mod pool;
pub mod view;

pub use book::LineBook;
pub use migration::MigrationReport;
pub use phone::{is_valid_phone_number, normalize_phone_input, validate_phone_number, PHONE_EXAMPLE};
pub use view::ViewRequest;
