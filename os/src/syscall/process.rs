//! 任务生命周期相关系统调用

use crate::mm::{translated_ref, translated_str};
use crate::task::{
    block_current_and_run_next, current_task, current_user_token, exit_current_and_run_next,
    spawn_user, TaskState,
};
use alloc::string::String;
use alloc::vec::Vec;
use task_core::argv::{MAX_ARGS, MAX_IMAGE_BYTES};

const PTR_SIZE: usize = core::mem::size_of::<usize>();
/// 可执行镜像名长度上限
const NAME_LIMIT: usize = 128;

pub fn sys_exit(exit_code: i32) -> ! {
    exit_current_and_run_next(exit_code);
}

/// 创建子任务并等待其退出。
///
/// ## Behavior
/// - `args` 是以空指针结尾的字符串指针数组，可以为空指针
/// - 参数个数超过 `MAX_ARGS`、参数区镜像超过 `MAX_IMAGE_BYTES`、
///   或任一指针越过未映射页，都返回 -1 而不创建任务
/// - 镜像不存在或校验失败时返回 -1，注册表保持原样
/// - 成功时阻塞到子任务退出，返回其退出状态
pub fn sys_exec(path: *const u8, args: *const usize) -> isize {
    if path.is_null() {
        return -1;
    }
    let token = current_user_token();
    let path = match translated_str(token, path, NAME_LIMIT) {
        Some(path) => path,
        None => return -1,
    };
    let mut args_vec: Vec<String> = Vec::new();
    // argc 槽 + 结尾空指针，随参数累计，超出预算即拒绝
    let mut image_bytes = 2 * PTR_SIZE;
    let mut args_ptr = args;
    while !args_ptr.is_null() {
        let arg_str_ptr = match translated_ref(token, args_ptr) {
            Some(p) => *p,
            None => return -1,
        };
        if arg_str_ptr == 0 {
            break;
        }
        if args_vec.len() == MAX_ARGS {
            return -1;
        }
        let arg = match translated_str(token, arg_str_ptr as *const u8, MAX_IMAGE_BYTES) {
            Some(arg) => arg,
            None => return -1,
        };
        image_bytes += arg.len() + 1 + PTR_SIZE;
        if image_bytes > MAX_IMAGE_BYTES {
            return -1;
        }
        args_vec.push(arg);
        args_ptr = unsafe { args_ptr.add(1) };
    }
    if args_vec.is_empty() {
        args_vec.push(path.clone());
    }
    let task = current_task().unwrap();
    match spawn_user(&path, &args_vec, Some(&task)) {
        Ok(child) => {
            log::debug!("task {} waits for child {}", task.tid.0, child.0);
            loop {
                if let Some(status) = task.inner_exclusive_access().child_exit_status.take() {
                    return status as isize;
                }
                block_current_and_run_next(TaskState::WaitingForChild, || {
                    task.inner_exclusive_access().child_exit_status.is_none()
                });
            }
        }
        Err(err) => {
            log::warn!("exec '{}' failed: {:?}", path, err);
            -1
        }
    }
}
