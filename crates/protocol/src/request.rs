//! Poll request document.

use serde::Serialize;

use crate::constants::{NOTICE_MODULE, NOTICE_TASK};

#[derive(Debug, Serialize)]
struct TaskRequest<'a> {
    module: ModuleRequest<'a>,
}

#[derive(Debug, Serialize)]
struct ModuleRequest<'a> {
    module_name: &'a str,
    task: TaskBody<'a>,
}

#[derive(Debug, Serialize)]
struct TaskBody<'a> {
    task_name: &'a str,
    #[serde(rename = "in")]
    input: TaskInput<'a>,
}

#[derive(Debug, Serialize)]
struct TaskInput<'a> {
    login_id: &'a str,
}

/// Builds the `get_noti` task document for the given login name.
pub fn build_request(login_id: &str) -> String {
    let request = TaskRequest {
        module: ModuleRequest {
            module_name: NOTICE_MODULE,
            task: TaskBody {
                task_name: NOTICE_TASK,
                input: TaskInput { login_id },
            },
        },
    };
    // Serializing string-only structs cannot fail.
    serde_json::to_string(&request).unwrap_or_default()
}
