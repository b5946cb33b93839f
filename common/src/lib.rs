pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod token;
pub mod utils;

pub use config::*;
pub use error::*;
pub use messages::*;
pub use models::identity::{Identity, IssuedToken, Role};
pub use token::TokenCodec;
pub use utils::*;
