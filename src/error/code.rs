//! 错误代码定义
//!
//! 错误代码按类别分组，每个类别占用1000个代码范围：
//! - 1000-1999: 配置相关错误
//! - 2000-2999: 参数校验错误
//! - 3000-3999: 注册中心后端错误
//! - 4000-4999: 服务发现错误

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    /// 注册中心连接配置无效
    ConfigInvalid = 1000,
    /// 服务描述校验失败
    ValidationFailed = 2000,
    /// 注册中心调用失败（网络、状态码或响应解析）
    BackendUnavailable = 3000,
    /// 服务没有可用实例
    ServiceNotFound = 4000,
}

impl ErrorCode {
    /// 获取错误代码字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
        }
    }

    /// 获取数值形式的错误代码
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 是否由调用方输入引起（配置或参数问题，重试无意义）
    pub fn is_caller_error(&self) -> bool {
        matches!(self, ErrorCode::ConfigInvalid | ErrorCode::ValidationFailed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
