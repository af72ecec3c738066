use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use log::{debug, error};
use nix::fcntl::OFlag;
use nix::unistd::{pipe2, ForkResult};

use super::error::ExecError;
use super::process::{exit_child, fork_process, wait_for};
use super::redirect::{install_owned, Stream, Streams};
use super::{EX_OSERR, FAILURE, SUCCESS};
use crate::shell::ast::{CommandTree, Node};
use crate::utils::config::Config;

pub struct Executor {
    pub(super) name: String,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        Self {
            name: config.name.clone(),
        }
    }

    /// 使用当前进程的 stdin/stdout 执行命令树
    pub fn execute(&self, tree: Option<&CommandTree>) -> i32 {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.evaluate(tree, stdin.as_fd(), stdout.as_fd())
    }

    /// 以继承的输入/输出执行命令树，成功返回 `0`，失败返回非零。
    /// 空树直接视为成功。
    ///
    /// fork、pipe、dup2、wait 失败会中止整个求值并返回 [`EX_OSERR`]。
    pub fn evaluate(
        &self,
        tree: Option<&CommandTree>,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> i32 {
        let Some(tree) = tree else {
            return SUCCESS;
        };
        match self.evaluate_node(tree, input, output) {
            Ok(status) => status,
            Err(e) => {
                self.report(&e);
                EX_OSERR
            }
        }
    }

    pub(super) fn report(&self, err: &ExecError) {
        error!("{}", err);
        eprintln!("{}: {}", self.name, err);
    }

    fn evaluate_node(
        &self,
        tree: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        let result = match &tree.node {
            Node::Command(command) => self.execute_command(tree, command, input, output),
            Node::And(left, right) => self.execute_and(tree, left, right, input, output),
            Node::Or(left, right) => self.execute_or(tree, left, right, input, output),
            Node::Sequence(left, right) => self.execute_sequence(tree, left, right, input, output),
            Node::Pipe(left, right) => self.execute_pipe(tree, left, right, input, output),
            Node::Subshell(inner) => self.execute_subshell(tree, inner, input, output),
        };

        // 非致命错误只让当前节点失败，由上层按运算符语义继续
        match result {
            Err(e) if !e.is_fatal() => {
                self.report(&e);
                Ok(FAILURE)
            }
            other => other,
        }
    }

    fn execute_and(
        &self,
        tree: &CommandTree,
        left: &CommandTree,
        right: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        let streams = Streams::resolve(tree, input, output)?;
        if self.evaluate_node(left, streams.input(), streams.output())? != SUCCESS {
            return Ok(FAILURE);
        }
        self.evaluate_node(right, streams.input(), streams.output())
    }

    fn execute_or(
        &self,
        tree: &CommandTree,
        left: &CommandTree,
        right: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        let streams = Streams::resolve(tree, input, output)?;
        let status = self.evaluate_node(left, streams.input(), streams.output())?;
        if status == SUCCESS {
            return Ok(status);
        }
        self.evaluate_node(right, streams.input(), streams.output())
    }

    fn execute_sequence(
        &self,
        tree: &CommandTree,
        left: &CommandTree,
        right: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        let streams = Streams::resolve(tree, input, output)?;
        let status = self.evaluate_node(left, streams.input(), streams.output())?;
        debug!("顺序执行, 左侧状态 {} 被忽略", status);
        self.evaluate_node(right, streams.input(), streams.output())
    }

    /// 左侧在子进程中写入管道；成功后右侧在当前进程中以管道读端为输入求值
    fn execute_pipe(
        &self,
        tree: &CommandTree,
        left: &CommandTree,
        right: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        if left.output.is_some() {
            return Err(ExecError::AmbiguousOutput);
        }
        if right.input.is_some() {
            return Err(ExecError::AmbiguousInput);
        }

        // 必须先 pipe 再 fork，子进程才能继承两端
        let (reader, writer) = pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;

        match fork_process()? {
            ForkResult::Child => {
                drop(reader);
                let status = match self.write_into_pipe(tree, left, input, writer) {
                    Ok(status) => status,
                    Err(e) => {
                        self.report(&e);
                        e.exit_code()
                    }
                };
                exit_child(status)
            }
            ForkResult::Parent { child } => {
                // 立即关闭写端，左侧结束后右侧才能读到 EOF
                drop(writer);
                if wait_for(child)? != SUCCESS {
                    debug!("管道左侧失败, 跳过右侧");
                    return Ok(FAILURE);
                }
                // 左侧成功后才打开管道节点自身的输出重定向
                let output = Stream::output(tree, output)?;
                self.evaluate_node(right, reader.as_fd(), output.as_fd())
            }
        }
    }

    /// 在子进程中运行：管道节点自身的输入重定向在这里打开，写端成为 stdout
    fn write_into_pipe(
        &self,
        tree: &CommandTree,
        left: &CommandTree,
        input: BorrowedFd<'_>,
        writer: OwnedFd,
    ) -> Result<i32, ExecError> {
        install_owned(writer, libc::STDOUT_FILENO)?;
        let input = Stream::input(tree, input)?;

        let stdout = io::stdout();
        self.evaluate_node(left, input.as_fd(), stdout.as_fd())
    }

    /// 子 shell 在独立进程中运行，内部的 cd 等不影响当前 shell
    fn execute_subshell(
        &self,
        tree: &CommandTree,
        inner: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        match fork_process()? {
            ForkResult::Parent { child } => wait_for(child),
            ForkResult::Child => {
                let status = match self.run_subshell(tree, inner, input, output) {
                    Ok(status) => status,
                    Err(e) => {
                        self.report(&e);
                        e.exit_code()
                    }
                };
                exit_child(status)
            }
        }
    }

    fn run_subshell(
        &self,
        tree: &CommandTree,
        inner: &CommandTree,
        input: BorrowedFd<'_>,
        output: BorrowedFd<'_>,
    ) -> Result<i32, ExecError> {
        Streams::resolve(tree, input, output)?.install()?;

        let stdin = io::stdin();
        let stdout = io::stdout();
        self.evaluate_node(inner, stdin.as_fd(), stdout.as_fd())
    }
}
