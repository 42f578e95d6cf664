//! 任务上下文与恢复目标
//!
//! ## Overview
//! `TaskContext` 保存任务让出 CPU 时的被调用者保存寄存器，
//! 布局与 `switch.S` 严格一致。`ResumeTarget` 标明任务被切入后
//! 恢复到哪里：内核任务直接进入内核入口跳板，用户任务经
//! `trap_return` 降级回用户态。

use crate::hal::trap_return;
use crate::task::kernel_task_entry;

/// 任务被重新选中后从哪条路径恢复执行
#[derive(Clone, Copy, Debug)]
pub enum ResumeTarget {
    /// 恢复为内核态执行流（worker、idle）
    Kernel,
    /// 经跳板 `__restore` 返回用户态
    User,
}

/// `__switch` 读写的上下文，字段顺序即内存布局
#[repr(C)]
pub struct TaskContext {
    ra: usize,
    sp: usize,
    s: [usize; 12],
}

impl TaskContext {
    /// 全零上下文。引导任务首次被换出时由 `__switch` 填充。
    pub fn zero_init() -> Self {
        Self {
            ra: 0,
            sp: 0,
            s: [0; 12],
        }
    }

    /// 构造新任务的初始上下文：首次被切入时从 `target`
    /// 对应的入口开始执行，栈指针指向任务内核栈顶。
    pub fn resume_to(target: ResumeTarget, kstack_top: usize) -> Self {
        let ra = match target {
            ResumeTarget::Kernel => kernel_task_entry as usize,
            ResumeTarget::User => trap_return as usize,
        };
        Self {
            ra,
            sp: kstack_top,
            s: [0; 12],
        }
    }
}
