use crate::hal::shutdown;
use crate::task::current_kstack_top;
use core::arch::asm;
use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("\n[kernel] PANIC!");
    if let Some(location) = info.location() {
        println!(
            "[kernel] panicked at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    if let Some(msg) = info.message() {
        println!("[kernel] Message: {}", msg);
    }
    backtrace();
    shutdown()
}

fn backtrace() {
    let mut fp: usize;
    let stop = current_kstack_top();
    unsafe {
        asm!("mv {}, s0", out(reg) fp);
    }
    println!("\n----START BACKTRACE----");
    for i in 0..10 {
        if fp == stop {
            break;
        }
        unsafe {
            println!("#{}:ra={:#x}", i, *((fp - 8) as *const usize));
            fp = *((fp - 16) as *const usize);
        }
    }
    println!("----END OF BACKTRACE----");
}
