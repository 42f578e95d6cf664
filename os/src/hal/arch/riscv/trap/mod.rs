//! 陷入处理
//!
//! ## Overview
//! 所有陷入都经由映射在最高页的跳板代码进出。用户态陷入走
//! `__alltraps` 保存现场到任务的陷入上下文页、切换到内核地址空间后
//! 进入 `trap_handler`；内核态陷入走 `__alltraps_k` 在当前内核栈上
//! 保存现场后进入 `trap_from_kernel`。
//!
//! ## Behavior
//! - 系统调用：`sepc += 4` 跳过 ecall，打开中断后分发
//! - 定时器中断：预约下一次 tick、轮询键盘，再让出 CPU
//! - 访存/非法指令异常：记录日志并强制退出当前任务

pub mod context;

use crate::hal::arch::riscv::timer::set_next_trigger;
use crate::hal::TRAMPOLINE;
use crate::syscall::syscall;
use crate::task::{
    current_trap_cx, current_user_token, exit_current_and_run_next, suspend_current_and_run_next,
};
use core::arch::{asm, global_asm};
use riscv::register::mtvec::TrapMode;
use riscv::register::scause::{Exception, Interrupt, Trap};
use riscv::register::{scause, sie, sscratch, sstatus, stval, stvec};

pub use context::TrapContext;

global_asm!(include_str!("trap.S"));

pub fn init() {
    set_kernel_trap_entry();
}

fn set_kernel_trap_entry() {
    extern "C" {
        fn __alltraps();
        fn __alltraps_k();
    }
    let __alltraps_k_va =
        __alltraps_k as *const () as usize - __alltraps as *const () as usize + TRAMPOLINE;
    unsafe {
        stvec::write(__alltraps_k_va, TrapMode::Direct);
        sscratch::write(trap_from_kernel as usize);
    }
}

fn set_user_trap_entry() {
    unsafe {
        stvec::write(TRAMPOLINE, TrapMode::Direct);
    }
}

pub fn enable_timer_interrupt() {
    unsafe {
        sie::set_stimer();
    }
}

pub fn enable_supervisor_interrupt() {
    unsafe {
        sstatus::set_sie();
    }
}

pub fn disable_supervisor_interrupt() {
    unsafe {
        sstatus::clear_sie();
    }
}

pub fn supervisor_interrupt_enabled() -> bool {
    sstatus::read().sie()
}

/// 用户态陷入入口。
///
/// 返回路径固定走 `trap_return`，因此声明为发散函数。
#[no_mangle]
pub fn trap_handler() -> ! {
    set_kernel_trap_entry();
    let scause = scause::read();
    let stval = stval::read();
    match scause.cause() {
        Trap::Exception(Exception::UserEnvCall) => {
            let mut cx = current_trap_cx();
            cx.sepc += 4;
            enable_supervisor_interrupt();
            let result = syscall(
                cx.general_regs.x[17],
                [cx.general_regs.x[10], cx.general_regs.x[11]],
            );
            // 阻塞型调用会经历多次调度，返回前重新取陷入上下文
            cx = current_trap_cx();
            cx.general_regs.x[10] = result as usize;
        }
        Trap::Exception(Exception::StoreFault)
        | Trap::Exception(Exception::StorePageFault)
        | Trap::Exception(Exception::LoadFault)
        | Trap::Exception(Exception::LoadPageFault)
        | Trap::Exception(Exception::InstructionFault)
        | Trap::Exception(Exception::InstructionPageFault) => {
            log::error!(
                "[kernel] {:?} in application, bad addr = {:#x}, bad instruction = {:#x}, kernel killed it.",
                scause.cause(),
                stval,
                current_trap_cx().sepc,
            );
            exit_current_and_run_next(-2);
        }
        Trap::Exception(Exception::IllegalInstruction) => {
            log::error!("[kernel] IllegalInstruction in application, kernel killed it.");
            exit_current_and_run_next(-3);
        }
        Trap::Interrupt(Interrupt::SupervisorTimer) => {
            set_next_trigger();
            crate::drivers::keyboard::poll();
            suspend_current_and_run_next();
        }
        _ => {
            panic!(
                "Unsupported trap {:?}, stval = {:#x}!",
                scause.cause(),
                stval
            );
        }
    }
    trap_return();
}

/// 经跳板返回用户态。
#[no_mangle]
pub fn trap_return() -> ! {
    disable_supervisor_interrupt();
    set_user_trap_entry();
    let trap_cx_user_va = crate::hal::TRAP_CONTEXT_BASE;
    let user_satp = current_user_token();
    extern "C" {
        fn __alltraps();
        fn __restore();
    }
    let restore_va = __restore as usize - __alltraps as usize + TRAMPOLINE;
    unsafe {
        asm!(
            "fence.i",
            "jr {restore_va}",
            restore_va = in(reg) restore_va,
            in("a0") trap_cx_user_va,
            in("a1") user_satp,
            options(noreturn)
        );
    }
}

/// 内核态陷入入口。
///
/// 定时器中断同样驱动内核任务（worker、idle）的抢占：
/// 保存的现场留在当前任务内核栈上，任务被重新调度后
/// 从这里返回并经 `__restore_k` 恢复。
#[no_mangle]
pub fn trap_from_kernel(_trap_cx: &TrapContext) {
    let scause = scause::read();
    let stval = stval::read();
    match scause.cause() {
        Trap::Interrupt(Interrupt::SupervisorTimer) => {
            set_next_trigger();
            crate::drivers::keyboard::poll();
            suspend_current_and_run_next();
        }
        _ => {
            panic!(
                "Unsupported trap from kernel: {:?}, stval = {:#x}!",
                scause.cause(),
                stval
            );
        }
    }
}
