//! Token codec
//!
//! 访客 id 与公开 token 之间的可逆转换。同一部署生命周期内必须始终使用
//! 相同的 key 与最小长度，轮换 key 会使已下发的全部 token 失效。

mod hashids;

pub use hashids::{DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH, TokenCodec};
