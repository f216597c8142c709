// lib.rs — 库入口
// 对外暴露图片元数据记录、两种图片源以及配置管理

pub mod config; // 配置文件读取与保存
pub mod error; // 统一错误类型
pub mod record; // ImageRecord 数据结构
pub mod source; // 图片源抽象与实现

pub use error::SourceError;
pub use record::ImageRecord;
pub use source::file::FileSource;
pub use source::unsplash::UnsplashClient;
pub use source::{FetchHandle, ImageSource};
