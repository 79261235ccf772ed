//! Names and fixed values of the agent's D-Bus surface.

/// Well-known bus name of the agent on the system bus.
pub const AGENT_BUS_NAME: &str = "kr.gooroom.agent";

/// Object path exporting the agent interface.
pub const AGENT_OBJECT_PATH: &str = "/kr/gooroom/agent";

/// Interface name of the agent object.
pub const AGENT_INTERFACE: &str = "kr.gooroom.agent";

/// Method taking a JSON task document and returning a JSON reply.
pub const DO_TASK_METHOD: &str = "do_task";

/// Signal carrying an unsolicited notice-info document.
pub const PUSH_SIGNAL: &str = "set_noti";

/// `module.task.out.status` value of a successful poll.
pub const SUCCESS_STATUS: &str = "200";

/// Module and task names of the notice poll request.
pub const NOTICE_MODULE: &str = "noti";
pub const NOTICE_TASK: &str = "get_noti";
