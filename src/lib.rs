//! 命令树执行器：按 shell 语义执行 `&&`、`||`、`;`、`|`、`( )` 与文件重定向。
//!
//! 解析命令行不在本 crate 内，调用方构造 [`CommandTree`] 后交给 [`Executor`]。

pub mod shell;
pub mod utils;

pub use shell::{CommandTree, ExecError, Executor};
