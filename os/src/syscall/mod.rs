//! 系统调用分发
//!
//! 调用号经 `ecall` 由 x17 传入，参数在 x10/x11。
//! 未知调用号统一返回 -1，不改变任何任务状态。

mod io;
mod process;

use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(usize)]
pub enum SyscallId {
    Exit = 0,
    Putc = 1,
    Gets = 4,
    Exec = 5,
}

pub fn syscall(syscall_id: usize, args: [usize; 2]) -> isize {
    match SyscallId::try_from(syscall_id) {
        Ok(SyscallId::Exit) => process::sys_exit(args[0] as i32),
        Ok(SyscallId::Putc) => io::sys_putc(args[0]),
        Ok(SyscallId::Gets) => io::sys_gets(args[0] as *mut u8, args[1]),
        Ok(SyscallId::Exec) => process::sys_exec(args[0] as *const u8, args[1] as *const usize),
        Err(_) => {
            log::warn!("unsupported syscall id {}", syscall_id);
            -1
        }
    }
}
