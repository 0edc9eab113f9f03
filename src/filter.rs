//! Consul 过滤表达式

use std::fmt;

/// 服务列表过滤表达式
///
/// 目前只构造 `Service == "<name>"` 形式，对其它模块不透明。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExpression {
    expression: String,
    service: String,
}

impl FilterExpression {
    /// 按服务名过滤
    ///
    /// 名称中的 `"` 与 `\` 会被转义，保证表达式始终是单个字符串字面量。
    pub fn service_name(name: &str) -> Self {
        let mut literal = String::with_capacity(name.len());
        for ch in name.chars() {
            if matches!(ch, '"' | '\\') {
                literal.push('\\');
            }
            literal.push(ch);
        }

        Self {
            expression: format!("Service == \"{literal}\""),
            service: name.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// 表达式匹配的服务名（供进程内后端求值）
    #[cfg(any(test, feature = "testing"))]
    pub(crate) fn target_service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl AsRef<str> for FilterExpression {
    fn as_ref(&self) -> &str {
        &self.expression
    }
}
