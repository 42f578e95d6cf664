//! SBI 调用封装
//!
//! # Overview
//! 内核经由 `ecall` 陷入 M 态固件完成平台交互：定时器设置、
//! 控制台单字符输入输出与关机。显示与键盘在本平台上统一
//! 落到串口控制台。
//!
//! # Safety
//! - `sbi_call` 使用裸 `asm!` 触发 ecall，参数必须符合 SBI ABI

#![allow(unused)]

use core::arch::asm;

const SBI_SET_TIMER: usize = 0;
const SBI_CONSOLE_PUTCHAR: usize = 1;
const SBI_CONSOLE_GETCHAR: usize = 2;
const SBI_SHUTDOWN: usize = 8;

#[inline(always)]
fn sbi_call(which: usize, arg0: usize, arg1: usize, arg2: usize) -> usize {
    let mut ret;
    unsafe {
        asm!(
        "ecall",
        inlateout("x10") arg0 => ret,
        in("x11") arg1,
        in("x12") arg2,
        in("x17") which,
        );
    }
    ret
}

/// 设置下一次定时器中断的触发时刻。
pub fn set_timer(timer: usize) {
    sbi_call(SBI_SET_TIMER, timer, 0, 0);
}

/// 输出一个字符到控制台。
pub fn console_putchar(c: usize) {
    sbi_call(SBI_CONSOLE_PUTCHAR, c, 0, 0);
}

/// 读取一个字符；无输入时返回 `usize::MAX`。
pub fn console_getchar() -> usize {
    sbi_call(SBI_CONSOLE_GETCHAR, 0, 0, 0)
}

/// 关机。
pub fn shutdown() -> ! {
    sbi_call(SBI_SHUTDOWN, 0, 0, 0);
    panic!("It should shutdown!");
}
