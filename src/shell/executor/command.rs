use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::os::fd::BorrowedFd;
use std::path::PathBuf;
use std::process;

use log::debug;
use nix::unistd::{execvp, ForkResult};

use super::error::ExecError;
use super::executor::Executor;
use super::process::{exit_child, fork_process, wait_for};
use super::redirect::Streams;
use super::SUCCESS;
use crate::shell::ast::{Command, CommandTree};

impl Executor {
    /// 叶子节点：内建命令在当前进程执行，其余 fork 后 exec
    pub(super) fn execute_command(
        &self,
        tree: &CommandTree,
        command: &Command,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        // 处理内建命令
        match command.program.as_str() {
            "exit" => self.builtin_exit(),
            "cd" => {
                debug!("执行内建命令: {:?}", command);
                let _streams = Streams::resolve(tree, input, output)?;
                return self.builtin_cd(command.arguments.first());
            }
            _ => {}
        }

        // 执行外部命令
        debug!("执行外部命令: {:?}", command);
        let argv = command.argv().map_err(ExecError::NulByte)?;

        match fork_process()? {
            ForkResult::Parent { child } => wait_for(child),
            ForkResult::Child => {
                let status = match exec_command(tree, &argv, input, output) {
                    Ok(never) => match never {},
                    Err(e) => {
                        self.report(&e);
                        e.exit_code()
                    }
                };
                exit_child(status)
            }
        }
    }

    fn builtin_exit(&self) -> ! {
        debug!("退出 {}...", self.name);
        process::exit(0)
    }

    /// 目录切换必须发生在当前进程，子进程中切换对父 shell 无效
    fn builtin_cd(&self, target: Option<&String>) -> Result<i32, ExecError> {
        let path = match target {
            Some(dir) => PathBuf::from(dir),
            None => env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or(ExecError::HomeNotSet)?,
        };

        env::set_current_dir(&path)
            .map_err(|source| ExecError::ChangeDir { path, source })?;
        debug!("切换工作目录: {:?}", env::current_dir().ok());
        Ok(SUCCESS)
    }
}

/// 在子进程中安装重定向并替换进程映像，只有失败时才会返回
fn exec_command(
    tree: &CommandTree,
    argv: &[CString],
    input: BorrowedFd<'_>,
    output: BorrowedFd<'_>,
) -> Result<Infallible, ExecError> {
    Streams::resolve(tree, input, output)?.install()?;

    execvp(&argv[0], argv).map_err(|source| ExecError::Exec {
        program: argv[0].to_string_lossy().into_owned(),
        source,
    })
}
