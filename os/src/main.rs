#![no_std]
#![no_main]
#![feature(panic_info_message)]
#![feature(alloc_error_handler)]

extern crate alloc;
extern crate core;

use crate::hal::{enable_supervisor_interrupt, wait_for_interrupt};
use crate::timer::get_time_ms;
use alloc::string::String;
use core::arch::global_asm;

global_asm!(include_str!("link_app.S"));

#[macro_use]
pub mod console;
mod drivers;
mod hal;
mod lang_items;
mod loader;
mod mm;
mod sync;
mod syscall;
mod task;
mod timer;

/// 清理 BSS 段，将其全部置零
fn clear_bss() {
    extern "C" {
        fn sbss();
        fn ebss();
    }
    unsafe {
        core::slice::from_raw_parts_mut(
            sbss as *const () as usize as *mut u8,
            ebss as *const () as usize - sbss as usize,
        )
        .fill(0);
    }
}

/// 内核心跳任务：周期性打点，顺带证明抢占调度在工作。
fn kernel_heartbeat() {
    let mut last = get_time_ms();
    let mut beats: usize = 0;
    loop {
        let now = get_time_ms();
        if now - last >= 3000 {
            last = now;
            beats += 1;
            log::info!("heartbeat #{} at {} ms", beats, now);
        }
        task::suspend_current_and_run_next();
    }
}

#[no_mangle]
pub fn rust_main() -> ! {
    hal::bootstrap_init();
    clear_bss();
    console::init();
    println!("Welcome to PlumeOS!");
    mm::init();
    println!("Memory management initialized.");
    loader::list_apps();
    task::init();
    hal::machine_init();
    task::spawn_kernel_task(kernel_heartbeat);
    if let Err(err) = task::spawn_user("shell", &[String::from("shell")], None) {
        panic!("failed to start shell: {:?}", err);
    }
    println!("Initialization complete.");
    // 引导任务降级为 idle：只在没人可跑时占住 CPU 等中断
    enable_supervisor_interrupt();
    loop {
        wait_for_interrupt();
    }
}
