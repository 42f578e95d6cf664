//! 最小用户程序：打印一句话就退出，验证装载与系统调用路径。

#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

#[no_mangle]
fn main(_argc: usize, _argv: &[&str]) -> i32 {
    println!("Bonjour depuis l'espace utilisateur !");
    0
}
