//! 客户端统一错误定义
//!
//! 聚焦配置校验、信封编码与传输调用三类最小必要集合，
//! 便于在各实现层统一转换为 `ClientError`。
//!
use thiserror::Error;

/// 统一错误类型（客户端最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    // --- 配置校验 ---
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    // --- 信封编码 ---
    #[error("encoding error: {reason}")]
    Encoding { reason: String },

    // --- 传输调用 ---
    #[error("transport error: {reason}")]
    Transport { reason: String },
}

impl ClientError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        ClientError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn encoding(reason: impl Into<String>) -> Self {
        ClientError::Encoding {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        ClientError::Transport {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type ClientResult<T> = Result<T, ClientError>;

// 允许在传输实现层直接使用 `?` 将序列化错误转换为 ClientError
impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Encoding {
            reason: err.to_string(),
        }
    }
}
