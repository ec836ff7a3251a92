pub mod identity;

pub use identity::{IdentityRow, NewIdentity};
