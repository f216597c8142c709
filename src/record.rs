// record.rs — 图片元数据记录
// 不论来自本地文件还是 Unsplash，最终都转换成这个结构体供界面层展示

use serde::Serialize; // 序列化 trait，用于 --json 输出

/// 作者未知时使用的占位名
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// 一张图片的描述性元数据
///
/// 五个字段都是 `String`，永远不会缺失，调用方可以直接展示。
/// 字段私有、只提供只读访问器：记录一旦构建就不能再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// 作者显示名，无法确定时为 "Unknown"
    author_name: String,
    /// 作者主页链接，没有时为空字符串
    author_url: String,
    /// 图片说明文字
    description: String,
    /// 图片在原站的页面地址
    page_url: String,
    /// 可直接加载的图片地址
    image_url: String,
}

impl ImageRecord {
    /// 用五个字段构建一条新记录
    pub fn new(
        author_name: impl Into<String>,
        author_url: impl Into<String>,
        description: impl Into<String>,
        page_url: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            author_name: author_name.into(),
            author_url: author_url.into(),
            description: description.into(),
            page_url: page_url.into(),
            image_url: image_url.into(),
        }
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn author_url(&self) -> &str {
        &self.author_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }
}
