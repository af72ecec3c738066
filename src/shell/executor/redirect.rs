use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::debug;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::unistd::dup2;

use super::error::ExecError;
use crate::shell::ast::CommandTree;

const DEF_MODE: u32 = 0o664;

/// 一端流：继承自父节点，或由本节点重定向打开（本节点拥有并负责关闭）
pub(crate) enum Stream<'a> {
    Inherited(BorrowedFd<'a>),
    Opened(OwnedFd),
}

impl<'a> Stream<'a> {
    /// 节点自身的输入重定向，未设置时沿用继承的输入
    pub(crate) fn input(tree: &CommandTree, inherited: BorrowedFd<'a>) -> Result<Self, ExecError> {
        match &tree.input {
            Some(path) => Ok(Stream::Opened(open_input(path)?)),
            None => Ok(Stream::Inherited(inherited)),
        }
    }

    /// 节点自身的输出重定向，未设置时沿用继承的输出
    pub(crate) fn output(tree: &CommandTree, inherited: BorrowedFd<'a>) -> Result<Self, ExecError> {
        match &tree.output {
            Some(path) => Ok(Stream::Opened(open_output(path)?)),
            None => Ok(Stream::Inherited(inherited)),
        }
    }

    pub(crate) fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Stream::Inherited(fd) => *fd,
            Stream::Opened(fd) => fd.as_fd(),
        }
    }

    /// 复制到 slot 号描述符；本节点打开的原描述符随后关闭
    pub(crate) fn install(self, slot: RawFd) -> Result<(), ExecError> {
        match self {
            Stream::Inherited(fd) => move_to(fd, slot),
            Stream::Opened(fd) => install_owned(fd, slot),
        }
    }
}

/// 一个节点的有效输入/输出
pub(crate) struct Streams<'a> {
    input: Stream<'a>,
    output: Stream<'a>,
}

impl<'a> Streams<'a> {
    /// 先打开输入再打开输出，输入文件缺失时输出文件不会被创建或截断
    pub(crate) fn resolve(
        tree: &CommandTree,
        input: BorrowedFd<'a>,
        output: BorrowedFd<'a>,
    ) -> Result<Self, ExecError> {
        let input = Stream::input(tree, input)?;
        let output = Stream::output(tree, output)?;
        Ok(Self { input, output })
    }

    pub(crate) fn input(&self) -> BorrowedFd<'_> {
        self.input.as_fd()
    }

    pub(crate) fn output(&self) -> BorrowedFd<'_> {
        self.output.as_fd()
    }

    /// 仅在子进程中调用：把流复制到 0/1 号描述符
    pub(crate) fn install(self) -> Result<(), ExecError> {
        self.input.install(libc::STDIN_FILENO)?;
        self.output.install(libc::STDOUT_FILENO)?;
        Ok(())
    }
}

/// dup2 清除了目标描述符上的 close-on-exec 标志，原描述符保持不变
pub(crate) fn move_to(fd: BorrowedFd<'_>, slot: RawFd) -> Result<(), ExecError> {
    if fd.as_raw_fd() != slot {
        dup2(fd.as_raw_fd(), slot).map_err(ExecError::Dup)?;
    }
    Ok(())
}

/// 拥有的描述符已经位于 slot 时不能 drop，否则会关闭目标描述符本身
pub(crate) fn install_owned(fd: OwnedFd, slot: RawFd) -> Result<(), ExecError> {
    if fd.as_raw_fd() != slot {
        return move_to(fd.as_fd(), slot);
    }
    fcntl(slot, FcntlArg::F_SETFD(FdFlag::empty())).map_err(ExecError::Dup)?;
    let _ = fd.into_raw_fd();
    Ok(())
}

fn open_input(path: &Path) -> Result<OwnedFd, ExecError> {
    debug!("输入重定向: {}", path.display());
    File::open(path)
        .map(OwnedFd::from)
        .map_err(|source| ExecError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}

fn open_output(path: &Path) -> Result<OwnedFd, ExecError> {
    debug!("输出重定向: {}", path.display());
    File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(DEF_MODE)
        .open(path)
        .map(OwnedFd::from)
        .map_err(|source| ExecError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}
