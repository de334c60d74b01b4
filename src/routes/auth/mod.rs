pub mod check_email;
pub mod claims;
pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod register;
pub mod register_business;
pub mod resend_verification;
pub mod reset_password;
pub mod session;
pub mod social_login;
pub mod verify;

pub use check_email::handle_check_email;
pub use forgot_password::handle_forgot_password;
pub use login::{handle_login, handle_me};
pub use logout::handle_logout;
pub use register::handle_register;
pub use register_business::handle_register_business;
pub use resend_verification::handle_resend_verification;
pub use reset_password::{handle_reset_password, handle_verify_reset_token};
pub use social_login::{social_callback, social_login};
pub use verify::{verify_email_link, verify_email_post};
