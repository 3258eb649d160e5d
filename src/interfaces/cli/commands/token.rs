//! Token encode / decode commands

use colored::Colorize;

use crate::codec::TokenCodec;
use crate::interfaces::cli::CliError;

pub fn encode_id(codec: &TokenCodec, visitor_id: u64) -> Result<(), CliError> {
    if visitor_id == 0 {
        return Err(CliError::ParseError(
            "visitor id must be a positive integer".to_string(),
        ));
    }
    println!("{}", codec.encode(visitor_id));
    Ok(())
}

pub fn decode_token(codec: &TokenCodec, token: &str) -> Result<(), CliError> {
    match codec.decode(token) {
        Some(id) => {
            println!("{}", id);
            Ok(())
        }
        None => {
            eprintln!(
                "{} {}",
                "Token does not decode with the configured key:".yellow(),
                token.blue()
            );
            Err(CliError::ParseError(format!("invalid token: {}", token)))
        }
    }
}
