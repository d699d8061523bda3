//! 值对象

mod email;
mod password;
mod username;

pub use email::Email;
pub use password::HashedPassword;
pub use username::Username;
