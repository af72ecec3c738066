use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process;

pub fn parse_level(level: &str) -> LevelFilter {
    match level {
        level if level.eq_ignore_ascii_case("off") => LevelFilter::Off,
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// stdout 承载管道数据，日志只能写文件；文件不可用时退回 stderr
pub fn init_logger(config: &Config) {
    let level = parse_level(&config.logger_level);

    let target = match open_log_file(&config.logger_dir) {
        Ok(file) => Target::Pipe(Box::new(file)),
        Err(e) => {
            eprintln!(
                "{}: cannot open log file in {}: {}",
                config.name,
                config.logger_dir.display(),
                e
            );
            Target::Stderr
        }
    };

    let initialized = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(target)
        .filter(Some(&config.name), level)
        .filter(None, LevelFilter::Warn)
        .try_init();

    if initialized.is_ok() {
        log::debug!("日志级别设置为: {}", level);
    }
}

fn open_log_file(dir: &Path) -> std::io::Result<File> {
    // 创建日志目录
    fs::create_dir_all(dir)?;
    let date = Local::now().format("%Y-%m-%d");
    File::options()
        .create(true)
        .append(true)
        .open(dir.join(format!("treesh_{}.log", date)))
}
