//! 交互 shell：读一行输入，原样交给 fake_ai 处理，等它退出后
//! 回到提示符。

#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

use user_lib::{exec, gets};

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

#[no_mangle]
fn main(_argc: usize, _argv: &[&str]) -> i32 {
    println!("SHELL MAIN EXECUTED");
    println!("PlumeOS shell v0.1 - bienvenue !");

    let mut input_buffer = [0u8; 256];
    loop {
        print!("> ");
        // 内核最多写入 255 个字符并补结尾的 \0
        let n = gets(&mut input_buffer);
        if n <= 0 {
            continue;
        }
        let line = core::str::from_utf8(&input_buffer[..n as usize]).unwrap_or("");
        if is_blank(line) {
            continue;
        }
        // 用户输入作为 fake_ai 的第一个参数
        let argv = [
            b"fake_ai\0".as_ptr(),
            input_buffer.as_ptr(),
            core::ptr::null::<u8>(),
        ];
        let status = exec("fake_ai\0", &argv);
        if status < 0 {
            println!("shell: fake_ai introuvable");
        }
        input_buffer.fill(0);
    }
}
