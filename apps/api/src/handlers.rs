pub mod assets;
pub mod health;
pub mod last_login;
pub mod users;
