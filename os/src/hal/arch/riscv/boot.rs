//! 启动入口
//!
//! 设置启动栈指针后立即进入 `rust_main`。启动栈同时也是
//! 引导任务（后来降级为 idle 任务）的内核栈。

use core::arch::global_asm;

global_asm!(
    r#"
    .section .text.entry
    .globl _start
_start:
    la sp, boot_stack_top
    call rust_main

    .section .bss.stack
    .globl boot_stack
boot_stack:
    .space 4096 * 16
    .globl boot_stack_top
boot_stack_top:
"#
);
