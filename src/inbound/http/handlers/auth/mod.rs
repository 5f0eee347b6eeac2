mod login;
mod logout;
mod profile;

pub use login::auth_login;
pub use logout::auth_logout;
pub use profile::auth_profile;
