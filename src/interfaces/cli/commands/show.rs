//! Show a stored visitor record

use crate::codec::TokenCodec;
use crate::config::get_config;
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::open_store;

/// `show` 命令的查询目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowTarget {
    Id(i64),
    Token { visitor_id: i64, token: String },
}

impl ShowTarget {
    /// 纯数字视为 id，其余按 token 解码
    pub fn parse(codec: &TokenCodec, input: &str) -> Result<Self, CliError> {
        let input = input.trim();
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            let id = input
                .parse::<i64>()
                .map_err(|e| CliError::ParseError(format!("invalid visitor id: {}", e)))?;
            return Ok(ShowTarget::Id(id));
        }

        codec
            .decode(input)
            .and_then(|id| i64::try_from(id).ok())
            .map(|visitor_id| ShowTarget::Token {
                visitor_id,
                token: input.to_string(),
            })
            .ok_or_else(|| CliError::ParseError(format!("invalid token: {}", input)))
    }
}

pub async fn show_visitor(codec: &TokenCodec, target: &str) -> Result<(), CliError> {
    let target = ShowTarget::parse(codec, target)?;

    let config = get_config();
    let store = open_store(&config)
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;

    let record = match &target {
        ShowTarget::Id(id) => store.fetch_by_id(*id).await?,
        ShowTarget::Token { visitor_id, token } => {
            store.find_by_id_and_token(*visitor_id, token).await?
        }
    };

    let result = match record {
        Some(record) => {
            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| CliError::CommandError(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
        None => Err(CliError::CommandError(format!(
            "visitor not found: {:?}",
            target
        ))),
    };

    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close storage: {}", e);
    }
    result
}
