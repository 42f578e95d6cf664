pub mod arch;
mod platform;

pub use arch::{bootstrap_init, machine_init};
pub use arch::{console_getchar, console_putchar, shutdown};
pub use arch::{get_clock_freq, get_time, set_next_trigger};
pub use arch::{
    KERNEL_HEAP_SIZE, KERNEL_STACK_SIZE, MEMORY_END, PAGE_SIZE, PAGE_SIZE_BITS, TRAMPOLINE,
    TRAP_CONTEXT_BASE, USER_STACK_SIZE, USER_STACK_TOP,
};
pub use arch::{kstack_alloc, KernelStack};
pub use arch::{
    disable_supervisor_interrupt, enable_supervisor_interrupt, supervisor_interrupt_enabled,
    wait_for_interrupt, INTR_MASKING_INFO,
};
pub use arch::{trap_handler, trap_return, TrapContext};
pub use arch::{PTEFlags, PageTableEntryImpl, PageTableImpl};
pub use arch::__switch;

pub use platform::CLOCK_FREQ;
