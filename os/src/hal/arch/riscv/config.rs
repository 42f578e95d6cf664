#![allow(unused)]

pub const PAGE_SIZE: usize = 0x1000; // 4KB
pub const PAGE_SIZE_BITS: usize = 0xc; // 4KB = 2^12 Bytes

pub const USER_STACK_SIZE: usize = PAGE_SIZE * 4; // 16KB
pub const KERNEL_STACK_SIZE: usize = PAGE_SIZE * 2; // 8KB

pub const KERNEL_HEAP_SIZE: usize = PAGE_SIZE * 0x400; // 4MB

/// 最高页：跳板代码，内核与所有用户地址空间共享同一映射
pub const TRAMPOLINE: usize = usize::MAX - PAGE_SIZE + 1;
/// 跳板之下：用户任务的陷入上下文页
pub const TRAP_CONTEXT_BASE: usize = TRAMPOLINE - PAGE_SIZE;
/// 再留一页空隙后是保留的用户栈高区（栈顶），自此向低地址生长
pub const USER_STACK_TOP: usize = TRAP_CONTEXT_BASE - PAGE_SIZE;

pub const MEMORY_END: usize = 0x8800_0000;
