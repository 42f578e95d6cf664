//! 任务上下文切换
//!
//! `__switch` 保存当前任务的被调用者保存寄存器到 `current_task_cx_ptr`，
//! 再从 `next_task_cx_ptr` 恢复下一个任务的寄存器并跳转。
//! 对调用者而言它是一次"很久以后才返回"的普通函数调用。

use crate::task::TaskContext;
use core::arch::global_asm;

global_asm!(include_str!("switch.S"));

extern "C" {
    pub fn __switch(current_task_cx_ptr: *mut TaskContext, next_task_cx_ptr: *const TaskContext);
}
