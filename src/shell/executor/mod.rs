mod command;
mod error;
mod executor;
mod process;
mod redirect;

pub use error::ExecError;
pub use executor::Executor;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
/// sysexits.h 中的 EX_OSERR
pub const EX_OSERR: i32 = 71;

/// 会 fork 或修改工作目录/HOME 的测试必须串行执行
#[cfg(test)]
pub(crate) fn serial() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
