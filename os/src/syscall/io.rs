//! 控制台相关系统调用

use crate::drivers::keyboard;
use crate::task::{block_current_and_run_next, current_task, TaskState};

pub fn sys_putc(c: usize) -> isize {
    print!("{}", c as u8 as char);
    0
}

/// 读取一整行键盘输入。
///
/// ## Behavior
/// - 无效参数（空指针、零长度）立即返回 -1，不改变任务状态
/// - 已有其他任务的读请求在途时返回 -1
/// - 否则向键盘登记请求并阻塞，直到一行完整输入被拷入用户
///   缓冲区：最多 `len - 1` 个字符，末尾补 `\0`；
///   返回拷贝的字符数（不含终止符）
pub fn sys_gets(buf: *mut u8, len: usize) -> isize {
    if buf.is_null() || len == 0 {
        return -1;
    }
    let task = current_task().unwrap();
    if !keyboard::arm(buf as usize, len, task.tid) {
        return -1;
    }
    loop {
        if let Some(n) = task.inner_exclusive_access().syscall_return_value.take() {
            return n;
        }
        block_current_and_run_next(TaskState::WaitingForInput, || {
            task.inner_exclusive_access().syscall_return_value.is_none()
        });
    }
}
