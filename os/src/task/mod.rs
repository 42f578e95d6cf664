//! 任务管理
//!
//! ## Overview
//! 本模块把纯逻辑的任务环（`task_core::TaskRing`）与内核侧资源
//! （控制块、内核栈、地址空间）拼装成完整的任务子系统：
//! 创建内核/用户任务、轮转调度、阻塞与唤醒、退出与回收。
//!
//! ## Behavior
//! - `schedule` 是唯一的调度决策点，定时器中断和系统调用两条
//!   入口都汇聚到这里
//! - 调度全程关中断；环给出 `Stalled` 时开中断等待下一个事件
//!   后重试，而不是永久停机
//! - 每轮调度开始先回收已终止任务（保留仍占用 CPU 的当前任务）
//!
//! ## Invariants
//! - 环中每个 tid 在 `tasks` 表中都有对应控制块（调度临界区内
//!   两者一起变更）
//! - 任何时刻至多一个任务处于 `Running`

mod context;
mod registry;
mod task;

use crate::hal::{
    disable_supervisor_interrupt, enable_supervisor_interrupt, supervisor_interrupt_enabled,
    wait_for_interrupt, TrapContext, __switch,
};
use crate::mm::LoadError;
use alloc::string::String;
use alloc::sync::{Arc, Weak};

pub use context::{ResumeTarget, TaskContext};
pub use registry::{TaskRegistry, REGISTRY};
pub use task::{TaskControlBlock, TaskControlBlockInner, TaskUserRes};
pub use task_core::{Decision, TaskState, Tid};

/// 任务创建失败的原因
#[derive(Debug)]
pub enum SpawnError {
    /// 镜像名不存在
    NotFound,
    /// 镜像校验或装载失败
    Load(LoadError),
}

/// 把当前执行流登记为引导任务。必须在开定时器中断之前调用，
/// 否则第一次抢占会发生在没有任何任务的环上。
pub fn init() {
    REGISTRY.exclusive_session(|reg| {
        let tid = reg.ring.bootstrap();
        reg.tasks.insert(tid, Arc::new(TaskControlBlock::bootstrap(tid)));
        log::info!("bootstrap task registered as tid {}", tid.0);
    });
}

/// 创建一个内核任务，立即进入就绪队列。
pub fn spawn_kernel_task(entry: fn()) -> Tid {
    REGISTRY.exclusive_session(|reg| {
        let tid = reg.ring.insert();
        reg.tasks
            .insert(tid, Arc::new(TaskControlBlock::new_kernel(tid, entry)));
        log::debug!("kernel task tid {} spawned", tid.0);
        tid
    })
}

/// 按镜像名创建一个用户任务。
///
/// ## Behavior
/// - 镜像查找与校验都发生在改动注册表之前，任何失败都不会在
///   环中留下新任务
/// - `parent` 存在时，在同一临界区内登记其 `awaited_child`，
///   保证子任务先于登记运行并退出时唤醒不会丢失
pub fn spawn_user(
    name: &str,
    args: &[String],
    parent: Option<&Arc<TaskControlBlock>>,
) -> Result<Tid, SpawnError> {
    let elf_data = crate::loader::get_app_data_by_name(name).ok_or(SpawnError::NotFound)?;
    let res = TaskUserRes::build(elf_data, args).map_err(SpawnError::Load)?;
    let parent_weak: Option<Weak<TaskControlBlock>> = parent.map(Arc::downgrade);
    let tid = REGISTRY.exclusive_session(|reg| {
        let tid = reg.ring.insert();
        reg.tasks
            .insert(tid, Arc::new(TaskControlBlock::new_user(tid, res, parent_weak)));
        if let Some(parent) = parent {
            parent.inner_exclusive_access().awaited_child = Some(tid);
        }
        tid
    });
    log::info!("user task '{}' spawned as tid {}", name, tid.0);
    Ok(tid)
}

pub fn current_task() -> Option<Arc<TaskControlBlock>> {
    REGISTRY.exclusive_session(|reg| reg.current_tcb())
}

pub fn task_by_tid(tid: Tid) -> Option<Arc<TaskControlBlock>> {
    REGISTRY.exclusive_session(|reg| reg.task_of(tid))
}

pub fn current_user_token() -> usize {
    current_task().unwrap().user_token()
}

pub fn current_trap_cx() -> &'static mut TrapContext {
    current_task().unwrap().inner_exclusive_access().get_trap_cx()
}

/// 当前任务的内核栈顶。引导任务使用启动栈。
pub fn current_kstack_top() -> usize {
    extern "C" {
        fn boot_stack_top();
    }
    match current_task() {
        Some(task) => match &task.kstack {
            Some(kstack) => kstack.get_top(),
            None => boot_stack_top as usize,
        },
        None => boot_stack_top as usize,
    }
}

/// 调度：回收终止任务、挑选下一个就绪任务并完成上下文切换。
///
/// ## Behavior
/// - 整个函数体在关中断下执行；被换出的任务恢复执行时从
///   `__switch` 返回处继续，并按自己进入时的中断状态恢复
/// - `Stalled`（无可运行任务）时短暂开中断执行 `wfi`，由定时器
///   或键盘事件打破僵局后重试
pub fn schedule() {
    let sie_was_on = supervisor_interrupt_enabled();
    disable_supervisor_interrupt();
    loop {
        let decision = REGISTRY.exclusive_session(|reg| {
            for tid in reg.ring.reap() {
                reg.tasks.remove(&tid);
                log::debug!("task {} reaped", tid.0);
            }
            reg.ring.pick_next()
        });
        match decision {
            Decision::Keep => break,
            Decision::Switch { from, to } => {
                let (from_ptr, to_ptr) = REGISTRY.exclusive_session(|reg| {
                    (
                        reg.tasks.get(&from).unwrap().task_cx_ptr(),
                        reg.tasks.get(&to).unwrap().task_cx_ptr(),
                    )
                });
                unsafe {
                    __switch(from_ptr, to_ptr);
                }
                break;
            }
            Decision::Stalled => {
                enable_supervisor_interrupt();
                wait_for_interrupt();
                disable_supervisor_interrupt();
            }
        }
    }
    if sie_was_on {
        enable_supervisor_interrupt();
    }
}

/// 主动让出 CPU。当前任务仍然就绪，轮转到环中下一个就绪任务。
pub fn suspend_current_and_run_next() {
    schedule();
}

/// 若 `should_block` 仍然成立则把当前任务置为 `state` 并调度。
///
/// 检查与入睡在同一关中断临界区内完成，事件与阻塞之间不存在
/// 唤醒丢失窗口。返回是否真的阻塞过。
pub fn block_current_and_run_next<F>(state: TaskState, should_block: F) -> bool
where
    F: FnOnce() -> bool,
{
    assert!(state.is_waiting());
    let sie_was_on = supervisor_interrupt_enabled();
    disable_supervisor_interrupt();
    let blocked = if should_block() {
        REGISTRY.exclusive_session(|reg| reg.ring.block_current(state));
        schedule();
        true
    } else {
        false
    };
    if sie_was_on {
        enable_supervisor_interrupt();
    }
    blocked
}

/// 唤醒一个等待中的任务。对非等待态任务是无操作。
pub fn wakeup_task(tid: Tid) -> bool {
    REGISTRY.exclusive_session(|reg| reg.ring.wake(tid))
}

/// 终止当前任务并调度。不再返回。
///
/// ## Behavior
/// - 用户态资源（地址空间）立即回收；内核栈保留到控制块
///   在后续调度回收轮中被丢弃
/// - 父任务恰好在等待本任务时，写入退出状态并唤醒
pub fn exit_current_and_run_next(exit_code: i32) -> ! {
    let task = current_task().expect("no current task on exit");
    log::info!("task {} exited with code {}", task.tid.0, exit_code);
    let parent = {
        let mut inner = task.inner_exclusive_access();
        inner.res.take();
        inner.parent.take()
    };
    if let Some(parent) = parent.and_then(|weak| weak.upgrade()) {
        let should_wake = {
            let mut p = parent.inner_exclusive_access();
            if p.awaited_child == Some(task.tid) {
                p.awaited_child = None;
                p.child_exit_status = Some(exit_code);
                true
            } else {
                false
            }
        };
        if should_wake {
            wakeup_task(parent.tid);
        }
    }
    REGISTRY.exclusive_session(|reg| reg.ring.terminate_current());
    drop(task);
    schedule();
    panic!("unreachable in exit_current_and_run_next!");
}

/// 内核任务的公共入口：`__switch` 首次切入后从这里开始，
/// 打开中断、执行任务函数，函数返回即任务退出。
#[no_mangle]
pub fn kernel_task_entry() -> ! {
    let entry = {
        let task = current_task().expect("kernel task entry without current task");
        let inner = task.inner_exclusive_access();
        inner.kernel_entry.expect("kernel task without entry")
    };
    enable_supervisor_interrupt();
    entry();
    exit_current_and_run_next(0);
}
