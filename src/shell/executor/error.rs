use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use super::{EX_OSERR, FAILURE};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Ambiguous output redirect.")]
    AmbiguousOutput,

    #[error("Ambiguous input redirect.")]
    AmbiguousInput,

    #[error("{}: {source}", .path.display())]
    Redirect { path: PathBuf, source: io::Error },

    #[error("cd: {}: {source}", .path.display())]
    ChangeDir { path: PathBuf, source: io::Error },

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("{0:?}: argument contains a nul byte")]
    NulByte(String),

    #[error("Failed to execute {program}: {source}")]
    Exec { program: String, source: Errno },

    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    #[error("pipe failed: {0}")]
    Pipe(#[source] Errno),

    #[error("dup2 failed: {0}")]
    Dup(#[source] Errno),

    #[error("wait failed: {0}")]
    Wait(#[source] Errno),
}

impl ExecError {
    /// 宿主暂时无法满足请求，终止整个求值
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecError::Fork(_) | ExecError::Pipe(_) | ExecError::Dup(_) | ExecError::Wait(_)
        )
    }

    /// 子进程因该错误退出时使用的退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Exec { .. } => EX_OSERR,
            err if err.is_fatal() => EX_OSERR,
            _ => FAILURE,
        }
    }
}
