// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/backdrop/config.toml 读取配置

use crate::source::ImageSource;
use crate::source::file::FileSource;
use crate::source::unsplash::UnsplashClient;
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~
use std::env; // 环境变量模块
use std::fs; // 文件系统模块
use std::path::{Path, PathBuf}; // 路径处理类型
use thiserror::Error;
use tracing::warn;

/// 覆盖配置文件中 Access Key 的环境变量
pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// 配置相关错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine $HOME")]
    NoHome,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown source kind {0:?} (expected \"file\" or \"unsplash\")")]
    UnknownSource(String),

    #[error("source is \"file\" but [source.file].location is not set")]
    MissingLocation,

    #[error("unknown config key {0:?}")]
    UnknownKey(String),

    #[error("refusing to overwrite {path:?}, it failed to parse: {reason}")]
    Unparsable { path: PathBuf, reason: String },
}

/// 可选的图片源类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// 本地文件
    File,
    /// Unsplash 随机图片
    #[default]
    Unsplash,
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(SourceKind::File),
            "unsplash" => Ok(SourceKind::Unsplash),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Unsplash => "unsplash",
        }
    }
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    source: SourceConfigs,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct CommonConfig {
    /// 默认图片来源 (file / unsplash)，默认 unsplash
    #[serde(default)]
    source: SourceKind,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct SourceConfigs {
    #[serde(default)]
    file: FileConfig,
    #[serde(default)]
    unsplash: UnsplashConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct FileConfig {
    /// 本地图片路径或 file:// URL (普通路径支持 ~ 展开)
    location: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct UnsplashConfig {
    /// Unsplash Access Key，不配置则使用内置的开发用 Key
    access_key: Option<String>,
    /// API 基础地址，不配置则使用 https://api.unsplash.com
    api_url: Option<String>,
}

/// 应用全局配置项
#[derive(Debug)]
pub struct AppConfig {
    /// 默认图片来源
    pub source: SourceKind,
    /// 本地图片地址（已展开 ~）
    pub file_location: Option<String>,
    /// 配置文件中的 Unsplash Access Key（只有它会被保存和导出）
    pub unsplash_access_key: Option<String>,
    /// 环境变量中的 Access Key，优先于配置文件，从不写回文件
    env_access_key: Option<String>,
    /// Unsplash API 基础地址
    pub unsplash_api_url: Option<String>,
    /// 配置文件所在路径
    pub config_path: PathBuf,
    /// 配置文件解析失败的原因；存在时拒绝保存，避免覆盖用户的文件
    load_error: Option<String>,
}

impl AppConfig {
    /// 从 $HOME/.config/backdrop/config.toml 初始化配置
    pub fn load() -> Result<Self, ConfigError> {
        let home = env::var("HOME").map_err(|_| ConfigError::NoHome)?;
        let config_path = PathBuf::from(home)
            .join(".config")
            .join("backdrop")
            .join("config.toml");
        Ok(Self::load_from(config_path))
    }

    /// 从指定路径初始化配置；文件不存在或无法解析时使用默认值
    pub fn load_from(config_path: PathBuf) -> Self {
        Self::load_with_env_key(config_path, env::var(ACCESS_KEY_ENV).ok())
    }

    fn load_with_env_key(config_path: PathBuf, env_key: Option<String>) -> Self {
        let (config_file, load_error) = match Self::load_config_from_file(&config_path) {
            Ok(config_file) => (config_file.unwrap_or_default(), None),
            Err(reason) => {
                warn!(path = %config_path.display(), error = %reason, "config file is not valid TOML, using defaults");
                (ConfigFile::default(), Some(reason))
            }
        };

        Self {
            source: config_file.common.source,
            file_location: config_file.source.file.location.map(|s| expand_location(&s)),
            unsplash_access_key: config_file.source.unsplash.access_key,
            env_access_key: env_key.filter(|key| !key.is_empty()),
            unsplash_api_url: config_file.source.unsplash.api_url,
            config_path,
            load_error,
        }
    }

    /// 辅助函数：解析 TOML 配置文件
    /// 文件不存在或不可读时返回 `Ok(None)`，内容无法解析时返回错误信息
    fn load_config_from_file(path: &Path) -> Result<Option<ConfigFile>, String> {
        let Ok(content) = fs::read_to_string(path) else {
            return Ok(None);
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| e.to_string())
    }

    /// 实际使用的 Access Key（优先级：ENV > TOML）
    pub fn effective_access_key(&self) -> Option<&str> {
        self.env_access_key
            .as_deref()
            .or(self.unsplash_access_key.as_deref())
    }

    /// 按配置构建图片源
    pub fn build_source(&self) -> Result<Box<dyn ImageSource>, ConfigError> {
        match self.source {
            SourceKind::File => {
                let location = self
                    .file_location
                    .clone()
                    .ok_or(ConfigError::MissingLocation)?;
                Ok(Box::new(FileSource::new(location)))
            }
            SourceKind::Unsplash => Ok(Box::new(self.unsplash_client())),
        }
    }

    /// 按配置构建 Unsplash 客户端
    pub fn unsplash_client(&self) -> UnsplashClient {
        let client = UnsplashClient::new(self.effective_access_key().map(str::to_string));
        match &self.unsplash_api_url {
            Some(url) => client.with_api_url(url.as_str()),
            None => client,
        }
    }

    /// 修改一个配置项（支持: source, file, access_key, api_url）
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "source" => self.source = value.parse()?,
            "file" | "location" => self.file_location = Some(expand_location(value)),
            "access_key" => self.unsplash_access_key = Some(value.to_string()),
            "api_url" => self.unsplash_api_url = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn to_config_file(&self) -> ConfigFile {
        ConfigFile {
            common: CommonConfig {
                source: self.source,
            },
            source: SourceConfigs {
                file: FileConfig {
                    location: self.file_location.clone(),
                },
                unsplash: UnsplashConfig {
                    access_key: self.unsplash_access_key.clone(),
                    api_url: self.unsplash_api_url.clone(),
                },
            },
        }
    }

    /// 将配置保存回文件（必要时创建目录）
    /// 环境变量中的 Access Key 不会被写入；原文件无法解析时拒绝覆盖
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(reason) = &self.load_error {
            return Err(ConfigError::Unparsable {
                path: self.config_path.clone(),
                reason: reason.clone(),
            });
        }
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(&self.to_config_file())?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema)
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let toml_str = toml::to_string_pretty(&self.to_config_file())?;

        // toml 库不支持带注释序列化，所以手动插入
        Ok(toml_str.replace(
            "[source.unsplash]",
            "# 内置的 Access Key 仅供开发使用，并非机密，请配置自己的 Key\n[source.unsplash]",
        ))
    }
}

/// 展开普通路径中的 ~；URL 形式（如 file:///...）原样返回
fn expand_location(location: &str) -> String {
    tilde(location).into_owned()
}
