// unsplash.rs — Unsplash API 异步客户端模块
// 负责与 Unsplash API 交互：获取一张随机图片的元数据

use super::{FetchHandle, ImageSource};
use crate::error::SourceError;
use crate::record::ImageRecord;
use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer}; // 反序列化 trait，用于将 JSON 转为 Rust 结构体
use tracing::{debug, warn};

/// Unsplash 生产环境 API 地址
pub const DEFAULT_API_URL: &str = "https://api.unsplash.com";

/// 内置的开发用 Access Key（base64 编码并拆成两段）
///
/// 拆开存放只是为了不被简单的文本搜索命中，**不是**保密手段：
/// 任何人都能从二进制或源码中还原它。正式使用请在配置文件中
/// 或通过 `UNSPLASH_ACCESS_KEY` 提供自己的 Key。
const BUILT_IN_KEY_PARTS: [&str; 2] = ["LWlTR3FPbXJYeTY1LW9ncU1uNGtNe", "TRlaDZXUmZSVVdDMGdrNllublh2Zw=="];

/// GET /photos/random 返回的 JSON 根对象（只提取需要的字段）
#[derive(Deserialize, Debug)]
struct Photo {
    /// 作者信息
    user: User,

    /// 替代文本，线上接口中可能为 null，但字段本身必须存在
    #[serde(deserialize_with = "nullable_string")]
    alt_description: Option<String>,

    /// 作者填写的说明，alt_description 为 null 时使用
    #[serde(default)]
    description: Option<String>,

    /// 图片相关链接
    links: PhotoLinks,

    /// 各尺寸图片 URL 集合
    urls: PhotoUrls,
}

#[derive(Deserialize, Debug)]
struct User {
    /// 作者显示名
    name: String,
    links: UserLinks,
}

#[derive(Deserialize, Debug)]
struct UserLinks {
    /// 作者资料的 API 地址
    #[serde(rename = "self")]
    self_link: String,
}

#[derive(Deserialize, Debug)]
struct PhotoLinks {
    /// 图片在 unsplash.com 上的页面
    html: String,
}

#[derive(Deserialize, Debug)]
struct PhotoUrls {
    /// 常规尺寸（宽 1080）图片 URL
    regular: String,
}

/// 要求字段存在，但允许值为 null
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

impl From<Photo> for ImageRecord {
    fn from(photo: Photo) -> Self {
        let description = photo
            .alt_description
            .or(photo.description)
            .unwrap_or_default();

        ImageRecord::new(
            photo.user.name,
            photo.user.links.self_link,
            description,
            photo.links.html,
            photo.urls.regular,
        )
    }
}

/// Access Key 的来源
#[derive(Debug, Clone)]
enum AccessKey {
    /// 调用方提供
    Supplied(String),
    /// 内置开发用 Key
    BuiltIn,
}

impl AccessKey {
    fn resolve(&self) -> Result<String, SourceError> {
        match self {
            AccessKey::Supplied(key) => Ok(key.clone()),
            AccessKey::BuiltIn => {
                let encoded = BUILT_IN_KEY_PARTS.concat();
                let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

/// Unsplash API 异步客户端
///
/// 封装了 reqwest::Client 和 API 配置。
/// Access Key 通过 `Authorization: Client-ID <key>` header 传递。
/// 克隆开销很小：内部的 reqwest::Client 共享同一个连接池。
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,

    /// API 基础 URL
    base_url: String,

    /// Unsplash Access Key
    access_key: AccessKey,
}

impl UnsplashClient {
    /// 创建新的 Unsplash 客户端
    ///
    /// # 参数
    /// - `access_key`: 从 Unsplash Developer 后台获取的 Access Key，
    ///   传 `None` 时使用内置的开发用 Key
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: String::from(DEFAULT_API_URL),
            access_key: access_key.map_or(AccessKey::BuiltIn, AccessKey::Supplied),
        }
    }

    /// 替换 API 基础 URL（测试或自建代理时使用），末尾的 `/` 会被去掉
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        self.base_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// 使用外部构建的 reqwest::Client（自定义代理、TLS 等）
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.base_url
    }

    /// 构建 Authorization header 的值
    /// Unsplash 使用 "Client-ID <key>" 格式，而非 Bearer token
    fn auth_header(&self) -> Result<String, SourceError> {
        Ok(format!("Client-ID {}", self.access_key.resolve()?))
    }

    /// 请求一张随机图片并转换成 ImageRecord
    ///
    /// 只有状态码恰好为 200 才算成功；其他状态码、网络错误、
    /// 响应体格式错误都会作为 `Err` 返回，不会得到半填充的记录。
    pub async fn random_photo(&self) -> Result<ImageRecord, SourceError> {
        let url = format!("{}/photos/random", self.base_url);
        debug!(%url, "requesting random photo");

        let response = self
            .client
            .get(&url)
            .header("Accept-Version", "v1")
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "random photo request failed");
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let photo: Photo = serde_json::from_str(&body)?;
        Ok(photo.into())
    }

    /// 在后台发起请求，立即返回可取消的句柄
    ///
    /// 每次调用都是独立的并发请求，没有去重、排队或限流。
    /// 必须在 tokio 运行时内调用。
    pub fn fetch_random(&self) -> FetchHandle<ImageRecord> {
        let client = self.clone();
        FetchHandle::spawn(move |gate| async move {
            let record = client.random_photo().await?;
            gate.deliver(|| record)
        })
    }

    /// 回调风格的 `fetch_random`
    ///
    /// `on_complete` 只在成功时被调用且恰好调用一次。失败不会进入回调，
    /// 而是记录一条 warn 日志并通过句柄的结果返回。
    /// 完成前调用 `abort()` 可以保证回调不会被调用（多线程运行时同样成立）。
    /// 回调内不能对同一个句柄调用 `abort()`。
    pub fn fetch_random_with<F>(&self, on_complete: F) -> FetchHandle<()>
    where
        F: FnOnce(ImageRecord) + Send + 'static,
    {
        let client = self.clone();
        FetchHandle::spawn(move |gate| async move {
            match client.random_photo().await {
                // 回调在闸门锁内执行，与 abort() 互斥
                Ok(record) => gate.deliver(|| on_complete(record)),
                Err(e) => {
                    warn!(error = %e, "random photo not delivered");
                    Err(e)
                }
            }
        })
    }
}

#[async_trait]
impl ImageSource for UnsplashClient {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    async fn image_record(&self) -> Result<ImageRecord, SourceError> {
        self.random_photo().await
    }
}
