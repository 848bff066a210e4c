use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alchemist::app::Application;
use alchemist::shutdown::shutdown_signal;
use alchemist_config::{AppConfig, LogLevel, OutputFormat};

fn data_files_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .value_name("FILE")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Append)
}

fn build_cli() -> Command {
    Command::new("alchemist")
        .version(env!("CARGO_PKG_VERSION"))
        .about("客户、Worker、任务表格的归一化、校验与分配规则配置")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别（默认取配置文件）")
                .value_parser(|s: &str| s.parse::<LogLevel>())
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式（默认取配置文件）")
                .value_parser(|s: &str| s.parse::<OutputFormat>())
                .global(true),
        )
        .subcommand(
            Command::new("validate")
                .about("加载文件并输出校验报告")
                .arg(
                    data_files_arg("files")
                        .num_args(1..)
                        .required(true)
                        .help("数据文件，种类由文件名推断"),
                )
                .arg(
                    Arg::new("suggest")
                        .long("suggest")
                        .help("同时输出解释器给出的纠正建议（不会自动应用）")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("rule")
                .about("把自然语言规则转换为规则JSON")
                .arg(Arg::new("text").required(true).help("规则描述"))
                .arg(
                    data_files_arg("data")
                        .long("data")
                        .num_args(1..)
                        .help("作为上下文的数据文件"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("自然语言任务搜索")
                .arg(Arg::new("query").required(true).help("查询语句"))
                .arg(
                    data_files_arg("data")
                        .long("data")
                        .num_args(1..)
                        .required(true)
                        .help("数据文件"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("导出归一化后的三张表和规则文件")
                .arg(
                    data_files_arg("files")
                        .num_args(1..)
                        .required(true)
                        .help("数据文件"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("输出目录（默认取配置文件）"),
                )
                .arg(
                    Arg::new("rules")
                        .long("rules")
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("之前导出的规则文件"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("运行API服务器，直到收到Ctrl+C")
                .arg(
                    data_files_arg("data")
                        .long("data")
                        .num_args(1..)
                        .help("启动时预加载的数据文件"),
                ),
        )
}

fn files_of(matches: &ArgMatches, name: &str) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>(name)
        .map(|files| files.cloned().collect())
        .unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("序列化输出失败")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config_path = matches.get_one::<String>("config");
    let config = AppConfig::load(config_path.map(String::as_str)).with_context(|| {
        format!(
            "加载配置失败: {}",
            config_path.map(String::as_str).unwrap_or("默认配置")
        )
    })?;

    let log_level = matches
        .get_one::<LogLevel>("log-level")
        .copied()
        .unwrap_or(config.observability.log_level);
    let log_format = matches
        .get_one::<OutputFormat>("log-format")
        .copied()
        .unwrap_or(config.observability.log_format);
    init_logging(log_level, log_format)?;

    let app = Application::new(config)?;

    match matches.subcommand() {
        Some(("validate", sub)) => {
            let output = app
                .validate(&files_of(sub, "files"), sub.get_flag("suggest"))
                .await?;
            print_json(&output)?;
        }
        Some(("rule", sub)) => {
            let text = sub.get_one::<String>("text").map(String::as_str).unwrap_or_default();
            let rule = app.rule(text, &files_of(sub, "data")).await?;
            print_json(&rule)?;
        }
        Some(("search", sub)) => {
            let query = sub.get_one::<String>("query").map(String::as_str).unwrap_or_default();
            let tasks = app.search(query, &files_of(sub, "data")).await?;
            print_json(&tasks)?;
        }
        Some(("export", sub)) => {
            let summary = app.export(
                &files_of(sub, "files"),
                sub.get_one::<PathBuf>("out").map(PathBuf::as_path),
                sub.get_one::<PathBuf>("rules").map(PathBuf::as_path),
            )?;
            print_json(&summary)?;
        }
        Some(("serve", sub)) => {
            info!("启动API服务器: {}", app.config().api.bind_address);
            app.serve(&files_of(sub, "data"), shutdown_signal()).await?;
            info!("已退出");
        }
        Some((other, _)) => return Err(anyhow::anyhow!("不支持的子命令: {other}")),
        None => return Err(anyhow::anyhow!("缺少子命令")),
    }

    Ok(())
}

/// 初始化日志系统，RUST_LOG 优先于配置的级别
fn init_logging(log_level: LogLevel, log_format: OutputFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    // 标准输出留给命令结果
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        OutputFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        OutputFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    Ok(())
}
