//! 用户态运行时
//!
//! `_start` 从内核铺好的用户栈上取回 argc/argv，整理成
//! `&[&str]` 后交给各程序的 `main`；`main` 返回即调用 exit。

#![no_std]
#![feature(linkage)]
#![feature(panic_info_message)]

#[macro_use]
pub mod console;
mod lang_items;
mod syscall;

pub use syscall::{exec, exit, gets, putchar};

const MAX_ARGS: usize = 8;

#[no_mangle]
#[link_section = ".text.entry"]
pub extern "C" fn _start(argc: usize, argv_base: usize) -> ! {
    let mut args: [&'static str; MAX_ARGS] = [""; MAX_ARGS];
    let n = argc.min(MAX_ARGS);
    for (i, slot) in args.iter_mut().enumerate().take(n) {
        let ptr = unsafe {
            ((argv_base + i * core::mem::size_of::<usize>()) as *const usize).read_volatile()
        } as *const u8;
        let mut len = 0;
        while unsafe { ptr.add(len).read_volatile() } != 0 {
            len += 1;
        }
        *slot = core::str::from_utf8(unsafe { core::slice::from_raw_parts(ptr, len) })
            .unwrap_or("");
    }
    exit(main(n, &args[..n]));
}

#[linkage = "weak"]
#[no_mangle]
fn main(_argc: usize, _argv: &[&str]) -> i32 {
    panic!("Cannot find main!");
}
