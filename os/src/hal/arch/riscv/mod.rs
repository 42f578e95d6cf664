use crate::hal::arch::riscv::timer::set_next_trigger;
use core::arch::asm;

pub mod boot;
pub mod config;
pub mod kernel_stack;
pub mod sbi;
pub mod sv39;
pub mod switch;
pub mod sync;
pub mod timer;
pub mod trap;

pub fn bootstrap_init() {}

pub fn machine_init() {
    trap::init();
    trap::enable_timer_interrupt();
    set_next_trigger();
    log::info!("RISC-V machine init completed.");
}

/// 挂起 CPU 直到下一个中断到来。
///
/// 只应在调度器的停摆等待窗口内使用，且调用时中断必须处于打开状态，
/// 否则 CPU 将永远停在这里。
pub fn wait_for_interrupt() {
    unsafe {
        asm!("wfi");
    }
}

pub type PageTableImpl = sv39::SV39PageTable;
pub type PageTableEntryImpl = sv39::PageTableEntry;
pub use sv39::PTEFlags;
