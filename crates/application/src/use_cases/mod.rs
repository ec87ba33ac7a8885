//! Application use cases (session lifecycle orchestration).

mod login;
mod logout;

pub use login::Login;
pub use logout::Logout;
