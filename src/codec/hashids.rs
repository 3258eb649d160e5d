//! Hashids 编码
//!
//! 基于 `harsh`（hashids.org v1 算法）：相同的 key 与最小长度会得到与
//! PHP/JS 版本完全一致的 token，已下发给浏览器的 cookie 在迁移后仍然有效。
//!
//! 这是可逆混淆而不是加密，唯一目标是不对外暴露自增主键。

use std::fmt;
use std::sync::Arc;

use harsh::Harsh;

use crate::errors::{Result, VisitrackError};

pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const MIN_ALPHABET_LENGTH: usize = 16;

/// token 最小长度默认值
pub const DEFAULT_MIN_LENGTH: usize = 16;

/// 整数 ↔ 不透明字符串的可逆编码器
#[derive(Clone)]
pub struct TokenCodec {
    inner: Arc<Harsh>,
    min_length: usize,
    alphabet_len: usize,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // salt 是密钥，不输出
        f.debug_struct("TokenCodec")
            .field("min_length", &self.min_length)
            .field("alphabet_len", &self.alphabet_len)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(salt: &str, min_length: usize) -> Result<Self> {
        Self::with_alphabet(salt, min_length, DEFAULT_ALPHABET)
    }

    /// 使用自定义字母表构建编码器
    ///
    /// 字母表只能是 ASCII，去重后至少 16 个字符，且不能包含空白字符。
    pub fn with_alphabet(salt: &str, min_length: usize, alphabet: &str) -> Result<Self> {
        if !alphabet.is_ascii() {
            return Err(VisitrackError::codec("字母表只能包含 ASCII 字符"));
        }

        let mut unique = String::with_capacity(alphabet.len());
        for c in alphabet.chars() {
            if !unique.contains(c) {
                unique.push(c);
            }
        }

        if unique.len() < MIN_ALPHABET_LENGTH {
            return Err(VisitrackError::codec(format!(
                "字母表至少需要 {} 个不同字符，当前 {}",
                MIN_ALPHABET_LENGTH,
                unique.len()
            )));
        }
        if unique.chars().any(|c| c.is_whitespace()) {
            return Err(VisitrackError::codec("字母表不能包含空白字符"));
        }

        let inner = Harsh::builder()
            .salt(salt)
            .length(min_length)
            .alphabet(unique.as_str())
            .build()
            .map_err(|e| VisitrackError::codec(format!("无法构建 Hashids 编码器: {}", e)))?;

        Ok(Self {
            inner: Arc::new(inner),
            min_length,
            alphabet_len: unique.len(),
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// 编码单个 id
    pub fn encode(&self, id: u64) -> String {
        self.encode_many(&[id])
    }

    /// 编码一组数字，空输入返回空串
    pub fn encode_many(&self, numbers: &[u64]) -> String {
        if numbers.is_empty() {
            return String::new();
        }
        self.inner.encode(numbers)
    }

    /// 解码为单个正整数
    ///
    /// 格式错误、使用其他 key 生成、包含多个数字或值为 0 的 token 都返回 None，
    /// 调用方应按"未知访客"处理，而不是当作错误。
    pub fn decode(&self, token: &str) -> Option<u64> {
        match self.decode_many(token)?.as_slice() {
            [id] if *id > 0 => Some(*id),
            _ => None,
        }
    }

    /// 解码为数字列表，非规范 token（重新编码后不一致）返回 None
    pub fn decode_many(&self, token: &str) -> Option<Vec<u64>> {
        if token.is_empty() || !token.is_ascii() {
            return None;
        }

        let numbers = self.inner.decode(token).ok()?;
        if numbers.is_empty() || self.encode_many(&numbers) != token {
            return None;
        }
        Some(numbers)
    }
}
