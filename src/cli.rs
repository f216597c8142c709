// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Args, Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// 桌面背景图片元数据工具
///
/// 从本地文件或 Unsplash 随机图片生成作者、说明、链接等元数据，
/// 供壁纸组件展示。
#[derive(Parser)]
#[command(name = "backdrop")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(author)] // 自动从 Cargo.toml 读取 authors 字段（如有）
#[command(about = "桌面背景图片元数据工具 — 本地文件或 Unsplash 随机图片")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 从配置的图片源获取一条元数据并打印
    ///
    /// 用法示例:
    ///   backdrop show
    ///   backdrop show --file ~/Pictures/wall.jpg
    ///   backdrop show --unsplash --json --timeout 10
    Show(ShowArgs),

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   backdrop completions zsh > ~/.zsh/completions/_backdrop
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   backdrop config show
    ///   backdrop config dump
    ///   backdrop config set source file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub struct ShowArgs {
    /// 使用本地文件（路径或 file:// URL），覆盖配置中的来源
    #[arg(short, long, conflicts_with = "unsplash")]
    pub file: Option<String>,

    /// 使用 Unsplash 随机图片，覆盖配置中的来源
    #[arg(short, long)]
    pub unsplash: bool,

    /// 以 JSON 格式输出
    #[arg(long)]
    pub json: bool,

    /// 等待远程请求的最长秒数（默认不限制）
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前所有配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项的值 (支持: source, file, access_key, api_url)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}
