//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(enable: bool, prio: Option<i32>) {
    use libc::{MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, mlockall, sched_param, sched_setscheduler};
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !enable {
        return;
    }

    RT_ONCE.get_or_init(|| {
        let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            tracing::warn!(error = %err, "mlockall failed; continuing without locked memory");
        }

        let prio = prio.unwrap_or(10);
        let param = sched_param {
            sched_priority: prio,
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            tracing::warn!(error = %err, prio, "SCHED_FIFO not applied (needs CAP_SYS_NICE)");
        } else {
            tracing::info!(prio, "running under SCHED_FIFO with locked memory");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(enable: bool, _prio: Option<i32>) {
    if enable {
        tracing::warn!("--rt is only supported on Linux; ignoring");
    }
}
