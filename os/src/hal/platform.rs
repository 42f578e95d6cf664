//! QEMU virt 平台参数。

pub const CLOCK_FREQ: usize = 12_500_000;
