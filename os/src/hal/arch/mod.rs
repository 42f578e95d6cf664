#[cfg(feature = "riscv")]
pub mod riscv;

#[cfg(feature = "riscv")]
pub use riscv::{
    bootstrap_init,
    config::{
        KERNEL_HEAP_SIZE, KERNEL_STACK_SIZE, MEMORY_END, PAGE_SIZE, PAGE_SIZE_BITS, TRAMPOLINE,
        TRAP_CONTEXT_BASE, USER_STACK_SIZE, USER_STACK_TOP,
    },
    kernel_stack::{kstack_alloc, KernelStack},
    machine_init,
    sbi::{console_getchar, console_putchar, shutdown},
    switch::__switch,
    sync::INTR_MASKING_INFO,
    timer::{get_clock_freq, get_time, set_next_trigger},
    trap::{
        disable_supervisor_interrupt, enable_supervisor_interrupt, supervisor_interrupt_enabled,
        trap_handler, trap_return, TrapContext,
    },
    wait_for_interrupt, PTEFlags, PageTableEntryImpl, PageTableImpl,
};
