//! 注册中心客户端错误处理模块
//!
//! 所有错误都直接返回给调用方，不做任何自动重试。

pub mod code;

pub use code::ErrorCode;

use thiserror::Error;

/// 注册中心客户端统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 无法构建注册中心连接
    #[error("invalid registry configuration: {0}")]
    Config(String),

    /// 服务描述不合法，未发起任何网络调用
    #[error("invalid service descriptor: {0}")]
    Validation(String),

    /// 注册中心返回失败（附带操作名）
    #[error("consul {operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    /// 服务没有任何实例
    #[error("service {service} has no available instances")]
    NotFound { service: String },
}

impl RegistryError {
    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        RegistryError::Config(msg.into())
    }

    /// 创建校验错误
    pub fn validation(msg: impl Into<String>) -> Self {
        RegistryError::Validation(msg.into())
    }

    /// 包装后端错误
    pub fn backend(operation: &'static str, error: impl std::fmt::Display) -> Self {
        RegistryError::Backend {
            operation,
            message: error.to_string(),
        }
    }

    pub fn not_found(service: impl Into<String>) -> Self {
        RegistryError::NotFound {
            service: service.into(),
        }
    }

    /// 对应的错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::Config(_) => ErrorCode::ConfigInvalid,
            RegistryError::Validation(_) => ErrorCode::ValidationFailed,
            RegistryError::Backend { .. } => ErrorCode::BackendUnavailable,
            RegistryError::NotFound { .. } => ErrorCode::ServiceNotFound,
        }
    }
}

/// 注册中心客户端结果类型
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_keeps_operation_context() {
        let err = RegistryError::backend("register", "connection refused");
        assert_eq!(err.code(), ErrorCode::BackendUnavailable);
        assert_eq!(err.to_string(), "consul register failed: connection refused");
    }

    #[test]
    fn not_found_names_the_service() {
        let err = RegistryError::not_found("billing");
        assert_eq!(err.code(), ErrorCode::ServiceNotFound);
        assert!(err.to_string().contains("billing"));
    }
}
