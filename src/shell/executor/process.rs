use std::io::{self, Write};

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use super::error::ExecError;
use super::{FAILURE, SUCCESS};

pub(crate) fn fork_process() -> Result<ForkResult, ExecError> {
    // SAFETY: 子进程只执行求值器代码，最终 exec 或 _exit
    let result = unsafe { fork() }.map_err(ExecError::Fork)?;
    if let ForkResult::Parent { child } = result {
        debug!("创建子进程: {}", child);
    }
    Ok(result)
}

/// 等待指定子进程并回收，只有正常退出且退出码为 0 才算成功
pub(crate) fn wait_for(child: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(pid, code)) => {
                debug!("子进程 {} 退出, 退出码 {}", pid, code);
                return Ok(if code == 0 { SUCCESS } else { FAILURE });
            }
            Ok(WaitStatus::Signaled(pid, signal, _core_dumped)) => {
                debug!("子进程 {} 被信号 {:?} 终止", pid, signal);
                return Ok(FAILURE);
            }
            Ok(status) => {
                debug!("忽略子进程状态: {:?}", status);
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}

/// 子进程经 _exit 结束，不运行 atexit 处理
pub(crate) fn exit_child(status: i32) -> ! {
    let _ = io::stdout().flush();
    // SAFETY: _exit 不会返回，也不访问任何 Rust 状态
    unsafe { libc::_exit(status) }
}
