//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置加载失败: {message}")]
    LoadError { message: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 解析失败的具体原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("服务未注册")]
    NotRegistered,

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("解析深度超过上限 {depth}")]
    DepthExceeded { depth: usize },

    #[error("没有活动的请求作用域")]
    NoRequestScope,

    #[error("类型转换失败: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("实例激活失败: {message}")]
    Activation { message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("容器已释放")]
    Disposed,

    #[error("参数无效: {message}")]
    InvalidArgument { message: String },

    #[error("没有合适的构造函数: {type_name}")]
    NoSuitableConstructor { type_name: String },

    #[error("依赖解析失败: {service}{}, 原因: {reason}", display_name(.name))]
    ResolutionFailed {
        service: String,
        name: Option<String>,
        #[source]
        reason: ResolutionFailure,
    },

    #[error("类型加载失败: {type_name}::{member}, 原因: {message}")]
    TypeLoad {
        type_name: String,
        member: String,
        message: String,
    },
}

fn display_name(name: &Option<String>) -> String {
    name.as_ref()
        .map(|name| format!(" (名称: {name})"))
        .unwrap_or_default()
}

impl DependencyError {
    /// 创建参数无效错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// 创建解析失败错误，附带请求的服务键信息
    pub fn resolution_failed(key: &crate::ServiceKey, reason: ResolutionFailure) -> Self {
        Self::ResolutionFailed {
            service: key.service_type().name().to_string(),
            name: key.name().map(str::to_string),
            reason,
        }
    }

    /// 创建激活失败错误
    pub fn activation(key: &crate::ServiceKey, message: impl Into<String>) -> Self {
        Self::resolution_failed(
            key,
            ResolutionFailure::Activation {
                message: message.into(),
            },
        )
    }

    /// 是否为“服务未注册”导致的解析失败
    pub fn is_not_registered(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed {
                reason: ResolutionFailure::NotRegistered,
                ..
            }
        )
    }

    /// 获取解析失败的原因
    pub fn resolution_failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::ResolutionFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
