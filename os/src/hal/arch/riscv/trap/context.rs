use riscv::register::sstatus::{read, Sstatus, SPP};

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneralRegs {
    pub x: [usize; 32],
}

/// 用户任务的陷入上下文
///
/// ## Overview
/// 保存在每个用户任务地址空间最高端的陷入上下文页中。
/// `__alltraps` 将用户态现场写入这里，`__restore` 据此返回用户态。
/// 末三个字段是内核在构造时写入的常量，陷入路径只读不写。
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TrapContext {
    pub general_regs: GeneralRegs,
    pub sstatus: Sstatus,
    pub sepc: usize,
    pub kernel_satp: usize,
    pub kernel_sp: usize,
    pub trap_handler: usize,
}

impl TrapContext {
    pub fn set_sp(&mut self, sp: usize) {
        self.general_regs.x[2] = sp;
    }

    /// 构造任务首次进入用户态所需的上下文。
    ///
    /// ## Behavior
    /// - `sstatus.SPP` 置为 User，`sret` 后降级到 U 态
    /// - `sepc` 指向任务入口，`sp` 指向准备好参数的用户栈顶
    pub fn app_init_context(
        entry: usize,
        sp: usize,
        kernel_satp: usize,
        kernel_sp: usize,
        trap_handler: usize,
    ) -> Self {
        let mut sstatus = read();
        sstatus.set_spp(SPP::User);
        let mut cx = Self {
            general_regs: GeneralRegs::default(),
            sstatus,
            sepc: entry,
            kernel_satp,
            kernel_sp,
            trap_handler,
        };
        cx.set_sp(sp);
        cx
    }
}
