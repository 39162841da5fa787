//! User domain entities.

pub mod lookup;
pub mod model;

pub use lookup::UserLookup;
pub use model::User;
