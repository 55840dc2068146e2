use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to fork child process: {source}")]
    Fork {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to install handler for {name}: {source}")]
    InstallHandler {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to signal process {pid}: {source}")]
    Kill {
        pid: i32,
        #[source]
        source: std::io::Error,
    },
    #[error("Stopped by signal {signal}")]
    Stopped { signal: i32, code: i32 },
    #[error("Exit requested with status {code}")]
    ExitRequested { code: i32 },
}
