//! Page objects for the admin console.

mod create_user;

pub use create_user::CreateUserPage;
