mod config_gen;
mod show;
mod token;
mod whoami;

pub use config_gen::config_generate;
pub use show::{ShowTarget, show_visitor};
pub use token::{decode_token, encode_id};
pub use whoami::whoami;
