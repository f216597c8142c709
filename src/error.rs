// error.rs — 图片源的统一错误类型

use thiserror::Error;

/// 获取图片元数据时可能出现的错误
///
/// 两种图片源共用这一个枚举：本地源只会产生 `MalformedEscape`，
/// 远程源产生其余几种。
#[derive(Debug, Error)]
pub enum SourceError {
    /// 文件地址中的百分号转义不合法（或解码结果不是 UTF-8）
    #[error("malformed escape in {location:?}: {reason}")]
    MalformedEscape {
        /// 原始文件地址
        location: String,
        /// 具体原因
        reason: String,
    },

    /// 接口返回了 200 以外的状态码
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP 状态码
        status: u16,
        /// 响应体原文
        message: String,
    },

    /// 网络层错误（连接失败、读取响应体失败等）
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 响应体不是合法 JSON，或缺少必需字段
    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// 内置 Access Key 无法解码
    #[error("built-in access key is corrupt: {0}")]
    Credential(#[from] base64::DecodeError),

    /// 请求在完成前被调用方取消
    #[error("fetch was cancelled")]
    Cancelled,

    /// 后台任务异常退出（panic）
    #[error("fetch task failed: {0}")]
    Task(tokio::task::JoinError),
}
