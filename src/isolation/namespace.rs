//! Namespace selection for sandbox isolation

use nix::sched::CloneFlags;

/// Namespaces the child is created into. The user namespace is what lets an
/// unprivileged invoker create the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub mount: bool,
    pub pid: bool,
    pub ipc: bool,
    pub uts: bool,
    pub user: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self::all()
    }
}

impl NamespaceConfig {
    /// All namespaces enabled
    pub fn all() -> Self {
        Self {
            mount: true,
            pid: true,
            ipc: true,
            uts: true,
            user: true,
        }
    }

    /// Convert to clone flags
    pub fn to_clone_flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.ipc {
            flags |= CloneFlags::CLONE_NEWIPC;
        }
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.user {
            flags |= CloneFlags::CLONE_NEWUSER;
        }
        flags
    }

    pub fn all_enabled(&self) -> bool {
        self.mount && self.pid && self.ipc && self.uts && self.user
    }

    pub fn enabled_count(&self) -> usize {
        [self.mount, self.pid, self.ipc, self.uts, self.user]
            .iter()
            .filter(|&&x| x)
            .count()
    }
}
