use std::env;
use std::process;

use log::debug;
use treesh::utils::config::Config;
use treesh::utils::log::init_logger;
use treesh::{CommandTree, Executor};

fn main() {
    let config = Config::new();
    init_logger(&config);
    debug!("配置加载成功 {}", config.config_dir.display());

    // 参数已由调用方拆分，整体作为一条简单命令执行
    let tree = CommandTree::from_argv(env::args().skip(1).collect());
    let executor = Executor::new(&config);
    let status = executor.execute(tree.as_ref());

    debug!("退出 {}, 状态 {}", config.name, status);
    process::exit(status);
}
