use serde::Serialize;

/// Best-effort snapshot of a runner, built without taking its lock.
/// Values may be stale by the time they are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerStatus {
    pub name: String,
    pub period_ms: u32,
    pub period_secs: u32,
    pub shutdown: bool,
}

impl std::fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.shutdown {
            write!(f, "{}: shut down", self.name)
        } else if self.period_ms == 0 {
            write!(f, "{}: paused", self.name)
        } else {
            write!(f, "{}: every {} ms", self.name, self.period_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(period_ms: u32, shutdown: bool) -> RunnerStatus {
        RunnerStatus {
            name: "checkpointer".to_string(),
            period_ms,
            period_secs: period_ms / 1000,
            shutdown,
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(status(0, false).to_string(), "checkpointer: paused");
        assert_eq!(status(2500, false).to_string(), "checkpointer: every 2500 ms");
        assert_eq!(status(2500, true).to_string(), "checkpointer: shut down");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(status(61_000, false)).unwrap();
        assert_eq!(json["name"], "checkpointer");
        assert_eq!(json["period_ms"], 61_000);
        assert_eq!(json["period_secs"], 61);
        assert_eq!(json["shutdown"], false);
    }
}
