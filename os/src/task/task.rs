//! 任务控制块
//!
//! ## Overview
//! `TaskControlBlock` 绑定一个任务的全部内核侧资源：内核栈、
//! 用户态资源（地址空间与陷入上下文页，内核任务没有）、
//! 任务上下文以及系统调用交互用的少量状态字段。
//! 调度状态本身不在这里，由注册表的就绪环统一维护。
//!
//! ## Invariants
//! - `tid` 全局唯一且终生不变
//! - 用户任务的 `res` 在退出路径上被提前回收，内核栈则保留到
//!   控制块整体被回收为止

use crate::hal::{
    kstack_alloc, trap_handler, KernelStack, TrapContext, TRAP_CONTEXT_BASE,
};
use crate::mm::{kernel_token, translated_byte_buffer, LoadError, MemorySet, PhysPageNum, VirtAddr};
use crate::sync::{UPIntrFreeCell, UPIntrRefMut};
use crate::task::context::{ResumeTarget, TaskContext};
use alloc::string::String;
use alloc::sync::Weak;
use task_core::{argv, Tid};

/// 用户任务独有的资源
pub struct TaskUserRes {
    pub memory_set: MemorySet,
    pub trap_cx_ppn: PhysPageNum,
    entry: usize,
    user_sp: usize,
    argc: usize,
    argv_base: usize,
}

impl TaskUserRes {
    /// 从可执行镜像构造地址空间并在用户栈上铺好参数区。
    ///
    /// 校验或构造失败时不留下任何痕迹，调用方可以把错误
    /// 直接回报给发起 exec 的任务。
    pub fn build(elf_data: &[u8], args: &[String]) -> Result<Self, LoadError> {
        let (memory_set, stack_top, entry) = MemorySet::from_elf(elf_data)?;
        let arg_refs: alloc::vec::Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let image = argv::build(stack_top, &arg_refs);
        let token = memory_set.token();
        let mut buffers = translated_byte_buffer(token, image.sp as *const u8, image.bytes.len());
        let mut off = 0;
        for buf in buffers.iter_mut() {
            buf.copy_from_slice(&image.bytes[off..off + buf.len()]);
            off += buf.len();
        }
        let trap_cx_ppn = memory_set
            .translate(VirtAddr::from(TRAP_CONTEXT_BASE).into())
            .unwrap()
            .ppn();
        Ok(Self {
            memory_set,
            trap_cx_ppn,
            entry,
            user_sp: image.sp,
            argc: image.argc,
            argv_base: image.argv_base,
        })
    }
}

pub struct TaskControlBlock {
    pub tid: Tid,
    /// 引导任务复用启动栈，没有独立内核栈
    pub kstack: Option<KernelStack>,
    inner: UPIntrFreeCell<TaskControlBlockInner>,
}

pub struct TaskControlBlockInner {
    pub res: Option<TaskUserRes>,
    pub task_cx: TaskContext,
    /// 内核任务首次运行时要进入的函数
    pub kernel_entry: Option<fn()>,
    pub parent: Option<Weak<TaskControlBlock>>,
    /// exec 之后等待的子任务
    pub awaited_child: Option<Tid>,
    pub child_exit_status: Option<i32>,
    /// 键盘完成回调等协作者为阻塞中的任务预置的返回值
    pub syscall_return_value: Option<isize>,
}

impl TaskControlBlock {
    /// 引导执行流的控制块。上下文为零，首次被换出时由
    /// `__switch` 填充。
    pub fn bootstrap(tid: Tid) -> Self {
        Self {
            tid,
            kstack: None,
            inner: unsafe {
                UPIntrFreeCell::new(TaskControlBlockInner {
                    res: None,
                    task_cx: TaskContext::zero_init(),
                    kernel_entry: None,
                    parent: None,
                    awaited_child: None,
                    child_exit_status: None,
                    syscall_return_value: None,
                })
            },
        }
    }

    /// 内核任务：在自己的内核栈上从 `entry` 开始执行。
    pub fn new_kernel(tid: Tid, entry: fn()) -> Self {
        let kstack = kstack_alloc();
        let kstack_top = kstack.get_top();
        Self {
            tid,
            kstack: Some(kstack),
            inner: unsafe {
                UPIntrFreeCell::new(TaskControlBlockInner {
                    res: None,
                    task_cx: TaskContext::resume_to(ResumeTarget::Kernel, kstack_top),
                    kernel_entry: Some(entry),
                    parent: None,
                    awaited_child: None,
                    child_exit_status: None,
                    syscall_return_value: None,
                })
            },
        }
    }

    /// 用户任务：资源已由 `TaskUserRes::build` 备好，这里补上
    /// 内核栈并写入首次进入用户态的陷入上下文。
    pub fn new_user(tid: Tid, res: TaskUserRes, parent: Option<Weak<TaskControlBlock>>) -> Self {
        let kstack = kstack_alloc();
        let kstack_top = kstack.get_top();
        let trap_cx = res.trap_cx_ppn.get_mut::<TrapContext>();
        *trap_cx = TrapContext::app_init_context(
            res.entry,
            res.user_sp,
            kernel_token(),
            kstack_top,
            trap_handler as usize,
        );
        trap_cx.general_regs.x[10] = res.argc;
        trap_cx.general_regs.x[11] = res.argv_base;
        Self {
            tid,
            kstack: Some(kstack),
            inner: unsafe {
                UPIntrFreeCell::new(TaskControlBlockInner {
                    res: Some(res),
                    task_cx: TaskContext::resume_to(ResumeTarget::User, kstack_top),
                    kernel_entry: None,
                    parent,
                    awaited_child: None,
                    child_exit_status: None,
                    syscall_return_value: None,
                })
            },
        }
    }

    pub fn inner_exclusive_access(&self) -> UPIntrRefMut<'_, TaskControlBlockInner> {
        self.inner.exclusive_access()
    }

    pub fn user_token(&self) -> usize {
        let inner = self.inner.exclusive_access();
        inner.res.as_ref().unwrap().memory_set.token()
    }

    pub fn task_cx_ptr(&self) -> *mut TaskContext {
        let mut inner = self.inner.exclusive_access();
        &mut inner.task_cx as *mut TaskContext
    }
}

impl TaskControlBlockInner {
    pub fn get_trap_cx(&self) -> &'static mut TrapContext {
        self.res.as_ref().unwrap().trap_cx_ppn.get_mut()
    }
}
