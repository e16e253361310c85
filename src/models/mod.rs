//! Domain models
//!
//! Database rows and the insert/update shapes the repositories accept.

pub mod achievement;
pub mod challenge;
pub mod notification;
pub mod submission;
pub mod user;

pub use achievement::*;
pub use challenge::*;
pub use notification::*;
pub use submission::*;
pub use user::*;
