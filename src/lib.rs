pub mod charset;
pub mod clipboard;
pub mod error;
pub mod generator;
pub mod menu;
pub mod policy;
pub mod qr;
pub mod ui;

pub use charset::CharClass;
pub use error::{InvalidPolicy, LengthInputError};
pub use generator::generate_password;
pub use policy::{Mode, PasswordPolicy, parse_length};
