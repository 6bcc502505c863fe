//! 容器配置
//!
//! 使用 `config` crate 从 TOML 文件、TOML 字符串或环境变量加载 [`ContainerOptions`]。

use infrastructure_common::{ConfigError, ConfigResult, Lifetime};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error};

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 延迟构建：注册暂存，第一次解析时构建
    #[default]
    Staged,
    /// 即时提交
    Direct,
}

/// 容器选项
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 使用的后端
    pub backend: BackendKind,
    /// 是否允许解析未注册的具体类型时自动注册
    pub implicit_registration: bool,
    /// 自动注册使用的生命周期
    pub implicit_lifetime: Lifetime,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            backend: BackendKind::Staged,
            implicit_registration: true,
            implicit_lifetime: Lifetime::Transient,
            max_resolution_depth: 64,
        }
    }
}

impl ContainerOptions {
    /// 从配置文件加载（格式由扩展名决定）
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载容器配置文件: {}", path.display());
        Self::load(config::Config::builder().add_source(config::File::from(path)))
    }

    /// 从 TOML 字符串加载
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::load(
            config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Toml)),
        )
    }

    /// 从环境变量加载，例如 `LORN_DI__MAX_RESOLUTION_DEPTH=32`
    pub fn from_env(prefix: &str) -> ConfigResult<Self> {
        Self::load(
            config::Config::builder().add_source(
                config::Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    fn load(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ConfigResult<Self> {
        let settings = builder.build().map_err(|e| {
            error!("容器配置加载失败: {}", e);
            ConfigError::LoadError {
                message: e.to_string(),
            }
        })?;
        let options: Self = settings.try_deserialize().map_err(|e| {
            error!("容器配置解析失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;
        options.validate()?;
        Ok(options)
    }

    /// 校验选项
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_implicit_registration(mut self, enabled: bool) -> Self {
        self.implicit_registration = enabled;
        self
    }

    pub fn with_implicit_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.implicit_lifetime = lifetime;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }
}
