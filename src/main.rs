// main.rs — 程序入口
// 负责初始化日志与异步运行时、解析命令行参数、按配置选择图片源并分发子命令

mod cli; // 声明 cli 模块，对应 src/cli.rs

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use backdrop::config::{AppConfig, SourceKind};
use backdrop::{FileSource, ImageRecord, ImageSource};
use clap::{CommandFactory, Parser}; // 引入 Parser trait 的 parse() 方法; CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands, ConfigAction, ShowArgs}; // 引入 CLI 结构体和子命令枚举
use rust_i18n::t; // 引入翻译宏
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 日志写到 stderr，stdout 只留给记录输出
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    // 解析命令行参数
    let cli = Cli::parse();

    // 读取配置文件与环境变量
    let mut config = AppConfig::load()?;

    // 根据子命令分发执行逻辑
    match &cli.command {
        Commands::Show(args) => {
            handle_show(&config, args).await?;
        }

        Commands::Completions { shell } => {
            generate(
                *shell,
                &mut Cli::command(),
                "backdrop",
                &mut std::io::stdout(),
            );
        }

        Commands::Config { action } => {
            handle_config(&mut config, action)?;
        }
    }

    Ok(())
}

/// 根据命令行覆盖项或配置选择图片源
fn select_source(
    config: &AppConfig,
    args: &ShowArgs,
) -> Result<Box<dyn ImageSource>, Box<dyn std::error::Error>> {
    if let Some(location) = &args.file {
        return Ok(Box::new(FileSource::new(location.as_str())));
    }
    if args.unsplash {
        return Ok(Box::new(config.unsplash_client()));
    }
    Ok(config.build_source()?)
}

/// 处理 show 子命令：取一条元数据并打印
async fn handle_show(config: &AppConfig, args: &ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = select_source(config, args)?;
    info!(source = source.name(), "resolving image record");

    // 超时由调用方负责，图片源本身不设超时
    let record = match args.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), source.image_record())
            .await
            .map_err(|_| t!("error_timeout", secs => secs))??,
        None => source.image_record().await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

/// 以人类可读的格式打印记录
fn print_record(record: &ImageRecord) {
    println!("{}", t!("record_description", value => record.description()));
    println!("{}", t!("record_author", value => record.author_name()));
    if !record.author_url().is_empty() {
        println!("{}", t!("record_author_url", value => record.author_url()));
    }
    println!("{}", t!("record_page", value => record.page_url()));
    println!("{}", t!("record_image", value => record.image_url()));
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!("{}", t!("config_source", source => config.source.as_str()));
            if config.source == SourceKind::File || config.file_location.is_some() {
                let location = config.file_location.as_deref().unwrap_or("None");
                println!("{}", t!("config_file", location => location));
            }
            let key_state = if config.effective_access_key().is_some() {
                t!("config_key_custom")
            } else {
                t!("config_key_builtin")
            };
            println!("{}", t!("config_access_key", state => key_state));
            println!(
                "{}",
                t!("config_api_url", url => config.unsplash_client().api_url())
            );
        }
        ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema()?);
        }
        ConfigAction::Dump => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}
