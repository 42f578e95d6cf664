use core::arch::asm;

const SYSCALL_EXIT: usize = 0;
const SYSCALL_PUTC: usize = 1;
const SYSCALL_GETS: usize = 4;
const SYSCALL_EXEC: usize = 5;

fn syscall(id: usize, args: [usize; 2]) -> isize {
    let mut ret: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("x10") args[0] => ret,
            in("x11") args[1],
            in("x17") id
        );
    }
    ret
}

pub fn exit(exit_code: i32) -> ! {
    syscall(SYSCALL_EXIT, [exit_code as usize, 0]);
    panic!("sys_exit never returns!");
}

pub fn putchar(c: u8) -> isize {
    syscall(SYSCALL_PUTC, [c as usize, 0])
}

/// 读一整行键盘输入到 `buf`：最多 `buf.len() - 1` 个字符，
/// 内核补 `\0` 终止符。返回读到的字符数（不含终止符）。
pub fn gets(buf: &mut [u8]) -> isize {
    syscall(SYSCALL_GETS, [buf.as_mut_ptr() as usize, buf.len()])
}

/// 创建子进程并等待其退出，返回其退出状态。
///
/// `path` 必须以 `\0` 结尾；`argv` 是以空指针结尾的
/// `\0` 结尾字符串指针数组。
pub fn exec(path: &str, argv: &[*const u8]) -> isize {
    syscall(SYSCALL_EXEC, [path.as_ptr() as usize, argv.as_ptr() as usize])
}
