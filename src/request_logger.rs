use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

/// Fairing that writes one access-log line per request.
///
/// Only the method, path, status and latency are logged. Query strings and
/// headers are left out so bearer tokens never reach the log.
pub struct RequestLogger;

struct RequestStart(Instant);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Access Log",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(|| RequestStart(Instant::now()));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed = request
            .local_cache(|| RequestStart(Instant::now()))
            .0
            .elapsed();
        let status = response.status();

        let line = format!(
            "{} {} -> {} ({:.2}ms)",
            request.method(),
            request.uri().path(),
            status.code,
            elapsed.as_secs_f64() * 1000.0
        );
        if status.code >= 500 {
            log::warn!("{}", line);
        } else {
            log::info!("{}", line);
        }
    }
}
