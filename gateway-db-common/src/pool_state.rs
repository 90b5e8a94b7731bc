/// Implemented by each dialect's pool so `DatabaseRegistry::health()` can
/// report `{name, open, in_use}` without knowing the backend's pool type.
pub trait GetPoolState {
    fn state(&self) -> PoolState;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PoolState {
    pub connections: u32,
    pub idle_connections: u32,
}

impl PoolState {
    pub fn in_use(&self) -> u32 {
        self.connections.saturating_sub(self.idle_connections)
    }
}

impl From<deadpool::Status> for PoolState {
    fn from(status: deadpool::Status) -> PoolState {
        PoolState {
            connections: status.size as u32,
            idle_connections: status.available.max(0) as u32,
        }
    }
}
