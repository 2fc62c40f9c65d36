//! 单元生命周期：由外部容器运行时驱动，这里只描述策略决定的状态转移。

use crate::compose::types::RestartPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// 进程以非零状态退出或被异常终止。
    Crashed,
    /// 进程以零状态正常退出。
    Exited,
    /// 运维显式停止。
    ManualStop,
    /// 宿主机或容器守护进程重启。
    HostReboot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    DeclaredInactive,
    Building,
    Running,
    Restarting,
    Stopped { cause: StopCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEvent {
    Activate,
    Deactivate,
    BuildSucceeded,
    BuildFailed,
    ProcessExited { success: bool },
    ManualStop,
    HostReboot,
    Start,
}

impl RestartPolicy {
    /// 单元停止后是否由运行时自动重启。
    pub fn should_restart(&self, cause: StopCause) -> bool {
        match self {
            RestartPolicy::No => false,
            RestartPolicy::Always | RestartPolicy::UnlessStopped => cause != StopCause::ManualStop,
            RestartPolicy::OnFailure => cause == StopCause::Crashed,
        }
    }

    /// 宿主机重启后，处于停止状态的单元是否被拉起。
    fn revives_after_reboot(&self, previous: StopCause) -> bool {
        match self {
            RestartPolicy::No | RestartPolicy::OnFailure => false,
            RestartPolicy::Always => true,
            RestartPolicy::UnlessStopped => previous != StopCause::ManualStop,
        }
    }
}

impl UnitState {
    pub fn initial(active: bool) -> Self {
        if active {
            UnitState::Building
        } else {
            UnitState::DeclaredInactive
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, UnitState::Running)
    }

    pub fn next(self, event: UnitEvent, policy: RestartPolicy) -> UnitState {
        match (self, event) {
            (_, UnitEvent::Deactivate) => UnitState::DeclaredInactive,
            (UnitState::DeclaredInactive, UnitEvent::Activate) => UnitState::Building,
            (UnitState::DeclaredInactive, _) => UnitState::DeclaredInactive,

            (UnitState::Building, UnitEvent::BuildSucceeded) => UnitState::Running,
            (UnitState::Building, UnitEvent::BuildFailed) => UnitState::Stopped {
                cause: StopCause::Crashed,
            },

            (UnitState::Running, UnitEvent::ProcessExited { success }) => {
                let cause = if success {
                    StopCause::Exited
                } else {
                    StopCause::Crashed
                };
                Self::after_stop(policy, cause)
            }
            (UnitState::Running, UnitEvent::HostReboot) => {
                Self::after_stop(policy, StopCause::HostReboot)
            }
            (UnitState::Running | UnitState::Restarting, UnitEvent::ManualStop) => {
                UnitState::Stopped {
                    cause: StopCause::ManualStop,
                }
            }

            (UnitState::Restarting, UnitEvent::Start) => UnitState::Running,

            (UnitState::Stopped { cause }, UnitEvent::HostReboot) => {
                if policy.revives_after_reboot(cause) {
                    UnitState::Restarting
                } else {
                    UnitState::Stopped { cause }
                }
            }
            (UnitState::Stopped { .. }, UnitEvent::Start) => UnitState::Running,

            (state, _) => state,
        }
    }

    fn after_stop(policy: RestartPolicy, cause: StopCause) -> UnitState {
        if policy.should_restart(cause) {
            UnitState::Restarting
        } else {
            UnitState::Stopped { cause }
        }
    }
}
