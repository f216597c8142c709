// file.rs — 本地文件图片源
// 只做字符串变换：从文件地址推导出展示用的文件名，不读取文件、不做任何 I/O

use super::ImageSource;
use crate::error::SourceError;
use crate::record::{ImageRecord, UNKNOWN_AUTHOR};
use async_trait::async_trait;

/// URI 保留字符：这些字符的转义形式在解码后保持原样
/// （因此 `%2F` 不会变成路径分隔符）
const RESERVED: &[u8] = b";/?:@&=+$,#";

/// 本地文件图片源
///
/// 构造时不做任何校验，地址不可达或格式不对只会在界面层表现为图片加载失败。
#[derive(Debug, Clone)]
pub struct FileSource {
    /// 文件路径或 URL（如 `file:///home/x/My%20Photo.jpg`）
    location: String,
}

impl FileSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// 原始文件地址
    pub fn location(&self) -> &str {
        &self.location
    }

    /// 生成描述这个文件的元数据记录
    ///
    /// - 作者固定为 "Unknown"，作者链接为空
    /// - 页面地址和图片地址都是原始文件地址
    /// - 说明文字是解码后地址的最后一段
    ///
    /// 转义序列不合法时返回 `SourceError::MalformedEscape`，不会退回原始字符串。
    pub fn describe(&self) -> Result<ImageRecord, SourceError> {
        let decoded = decode_uri(&self.location)?;
        let file_name = strip_leading_path(&decoded);

        Ok(ImageRecord::new(
            UNKNOWN_AUTHOR,
            "",
            file_name,
            self.location.as_str(),
            self.location.as_str(),
        ))
    }
}

#[async_trait]
impl ImageSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn image_record(&self) -> Result<ImageRecord, SourceError> {
        self.describe()
    }
}

/// 去掉路径部分，只保留文件名
///
/// 只处理第一个含 `/` 的行：删除该行开头到其中最后一个 `/`，
/// 其余行原样保留。解码出的换行（`%0A` 等）因此不会跨行匹配分隔符。
fn strip_leading_path(decoded: &str) -> String {
    let mut line_start = 0;
    let line_ends = decoded
        .char_indices()
        .filter(|&(_, ch)| is_line_terminator(ch))
        .chain(std::iter::once((decoded.len(), '\n')));

    for (end, terminator) in line_ends {
        if let Some(slash) = decoded[line_start..end].rfind('/') {
            return format!("{}{}", &decoded[..line_start], &decoded[line_start + slash + 1..]);
        }
        line_start = end + terminator.len_utf8();
    }
    decoded.to_string()
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// 按 URI 规则解码百分号转义
///
/// 每个 `%` 后必须跟两位十六进制数字，解码出的字节必须是合法 UTF-8；
/// 解码结果为保留字符的转义保持不变。
fn decode_uri(location: &str) -> Result<String, SourceError> {
    let bytes = location.as_bytes();
    let mut decoded = String::with_capacity(location.len());
    // 尚未解码的片段起点
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }

        let byte = bytes
            .get(i + 1..i + 3)
            .and_then(hex_byte)
            .ok_or_else(|| malformed(location, format!("invalid escape at byte {i}")))?;

        if RESERVED.contains(&byte) {
            decoded.push_str(&decode_chunk(location, &location[start..i])?);
            decoded.push_str(&location[i..i + 3]);
            start = i + 3;
        }
        i += 3;
    }

    decoded.push_str(&decode_chunk(location, &location[start..])?);
    Ok(decoded)
}

/// 解析两位十六进制数字
fn hex_byte(pair: &[u8]) -> Option<u8> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let digits = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(digits, 16).ok()
}

/// 解码一个只含合法转义的片段
fn decode_chunk(location: &str, chunk: &str) -> Result<String, SourceError> {
    urlencoding::decode(chunk)
        .map(|cow| cow.into_owned())
        .map_err(|e| malformed(location, e.to_string()))
}

fn malformed(location: &str, reason: String) -> SourceError {
    SourceError::MalformedEscape {
        location: location.to_string(),
        reason,
    }
}
