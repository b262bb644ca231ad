//! licensedcode 命令行工具
//! 功能说明：
//! 1. check：加载并校验整个语料库（许可证 + 规则），失败时非零退出
//! 2. validate：许可证库批量一致性检查，输出分级消息
//! 3. stats：规则长度分布统计
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use log::info;

use licensedcode::{validate, CorpusConfig, CorpusLoader, RuleStats};

#[derive(Parser)]
#[command(name = "licensedcode", version)]
#[command(about = "License and detection-rule corpus tooling", long_about = None)]
struct Cli {
    /// 数据根目录（包含 licenses/ 与 rules/），默认取 $LICENSEDCODE_DATA_DIR 或 ./data
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 单独指定许可证目录
    #[arg(long, global = true)]
    licenses_dir: Option<PathBuf>,

    /// 单独指定规则目录
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,

    /// 同时加载已废弃的许可证
    #[arg(long, global = true)]
    with_deprecated: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load licenses and rules and run all integrity checks
    Check,
    /// Validate the license database and report errors, warnings and infos
    Validate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Also report empty and duplicated URLs
        #[arg(long)]
        no_dupe_urls: bool,
        /// Log every message while validating
        #[arg(long)]
        verbose: bool,
    },
    /// Print rule length statistics
    Stats,
}

impl Cli {
    fn corpus_config(&self) -> CorpusConfig {
        let mut builder = CorpusConfig::builder().with_deprecated(self.with_deprecated);
        if let Some(data_dir) = &self.data_dir {
            builder = builder.data_dir(data_dir);
        }
        if let Some(licenses_dir) = &self.licenses_dir {
            builder = builder.licenses_dir(licenses_dir);
        }
        if let Some(rules_dir) = &self.rules_dir {
            builder = builder.rules_dir(rules_dir);
        }
        builder.build()
    }
}

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// 返回 Ok(false) 表示命令执行完成但发现了问题
fn run(cli: &Cli) -> Result<bool> {
    let loader = CorpusLoader::new(cli.corpus_config());
    let start = Instant::now();

    match &cli.command {
        Commands::Check => {
            let corpus = loader.get_rules().context("corpus integrity check failed")?;
            println!(
                "{} licenses, {} rules ({} from license texts)",
                corpus.licenses_by_key.len(),
                corpus.rules.len(),
                corpus.license_rules_count()
            );
            info!("Check completed in {:?}", start.elapsed());
            Ok(true)
        }
        Commands::Validate {
            json,
            no_dupe_urls,
            verbose,
        } => {
            let licenses = loader.load_licenses().context("cannot load licenses")?;
            let report = validate(&licenses, loader.tokenizer(), *verbose, *no_dupe_urls);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (title, messages) in [
                    ("ERRORS", &report.errors),
                    ("WARNINGS", &report.warnings),
                    ("INFOS", &report.infos),
                ] {
                    for (key, lines) in messages {
                        println!("{} for: {}:\n  {}", title, key, lines.join("\n  "));
                    }
                }
            }
            info!(
                "Validated {} licenses in {:?}: {} with errors",
                licenses.len(),
                start.elapsed(),
                report.errors.len()
            );
            Ok(report.is_clean())
        }
        Commands::Stats => {
            let mut corpus = loader.get_rules().context("corpus integrity check failed")?;
            corpus.tokenize_rules(loader.tokenizer())?;
            let stats = RuleStats::from_rules(&corpus.rules);
            stats.print_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(true)
        }
    }
}
