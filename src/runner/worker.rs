use tracing::info;

use crate::error::AppResult;
use crate::launcher::StopFlag;
use crate::pipeline::Handler;

use super::SharedQueue;

/// Worker process body: pops environments, runs them through `handler`,
/// and logs each request and response until `stop` is raised.
///
/// # Errors
///
/// Returns the stopped-by-signal condition once `stop` is raised, or any
/// queue failure.
pub fn serve<H>(queue: &SharedQueue, handler: &H, stop: &StopFlag) -> AppResult<()>
where
    H: Handler + ?Sized,
{
    let pid = std::process::id();
    loop {
        let Some(env) = queue.pop(stop)? else {
            stop.check()?;
            return Ok(());
        };
        info!("{}: Processing request {:#?}", pid, env);

        let response = handler.handle(&env);
        info!(
            "{}: Response code {:?}; headers {:#?}; body {:?}",
            pid,
            response.status_line(),
            response.headers(),
            response.body()
        );
    }
}
