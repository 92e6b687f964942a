//! HTTP server for the ESP32 web API.
//!
//! Serves the same endpoints as the desktop server through the shared
//! [`HttpApiHandler`]. The esp-idf-svc handlers run on the HTTP server
//! task, so they never touch the controller: reads come from a snapshot
//! the control loop publishes, and commands go into a bounded queue the
//! loop drains at the top of each pass.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_fridge::hal::esp32::{Esp32HttpServer, Esp32SharedState};
//! use rs_fridge::services::{FridgeSnapshot, UpdateService};
//!
//! let shared = Arc::new(Esp32SharedState::new(
//!     FridgeSnapshot::capture(&controller, 0, Default::default()),
//!     UpdateService::new(config.update.clone()),
//! ));
//! let server = Esp32HttpServer::new(&config.web, shared.clone())?;
//!
//! loop {
//!     shared.drain_into(&mut controller, clock.now_ms());
//!     // ... sample, tick ...
//!     shared.publish(FridgeSnapshot::capture(&controller, now, wifi.status()));
//! }
//! ```

use std::sync::{Arc, Mutex};

use esp_idf_hal::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;

use crate::commands::{CalibrationSlot, CommandQueue, ControlCommand};
use crate::config::WebConfig;
use crate::history::{LogEntry, TemperatureLog};
use crate::services::http_handler::{ApiResult, HttpApiHandler};
use crate::services::shared::{lock, FridgeSnapshot, StateProvider, Submission, UpdateService};
use crate::traits::{Clock, CompressorRelay, ConfigStorage, ZoneValve};
use crate::{FridgeController, FridgeError};

use super::Esp32Clock;

/// Pending commands the HTTP task can queue between two loop passes.
pub const COMMAND_QUEUE_DEPTH: usize = 16;

/// Largest request body read.
const MAX_BODY: usize = 1024;

struct Published {
    snapshot: FridgeSnapshot,
    history: TemperatureLog,
    queue: CommandQueue<COMMAND_QUEUE_DEPTH>,
}

/// State shared between the HTTP handlers and the control loop.
///
/// Unlike [`SharedFridgeState`](crate::services::SharedFridgeState), this
/// does not own the controller. The loop publishes what the API reads and
/// applies what the API queues.
pub struct Esp32SharedState {
    inner: Mutex<Published>,
    updates: UpdateService,
    clock: Esp32Clock,
}

impl Esp32SharedState {
    /// Start with an initial snapshot and the update service.
    pub fn new(snapshot: FridgeSnapshot, updates: UpdateService) -> Self {
        Self {
            inner: Mutex::new(Published {
                snapshot,
                history: TemperatureLog::default(),
                queue: CommandQueue::new(),
            }),
            updates,
            clock: Esp32Clock::new(),
        }
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: FridgeSnapshot) {
        lock(&self.inner).snapshot = snapshot;
    }

    /// Mirror a new history entry. Call once per appended sample.
    pub fn record(&self, entry: LogEntry) {
        lock(&self.inner).history.append(entry);
    }

    /// Apply every queued command to `controller`, oldest first.
    pub fn drain_into<R, V, S>(&self, controller: &mut FridgeController<R, V, S>, now_ms: u64) -> usize
    where
        R: CompressorRelay,
        V: ZoneValve,
        S: ConfigStorage,
    {
        let mut inner = lock(&self.inner);
        if inner.queue.is_empty() {
            return 0;
        }
        controller.drain_commands(&mut inner.queue, now_ms)
    }

    /// Update service shared with the API.
    pub fn update_service(&self) -> &UpdateService {
        &self.updates
    }
}

impl StateProvider for Arc<Esp32SharedState> {
    fn snapshot(&self) -> FridgeSnapshot {
        lock(&self.inner).snapshot.clone()
    }

    fn history(&self) -> Vec<LogEntry> {
        lock(&self.inner).history.snapshot()
    }

    fn submit(&self, cmd: ControlCommand) -> Result<Submission, FridgeError> {
        lock(&self.inner).queue.push(cmd)?;
        Ok(Submission::Queued)
    }

    fn updates(&self) -> &UpdateService {
        &self.updates
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

// ============================================================================
// Server
// ============================================================================

type Req<'r, 'c> = Request<&'r mut EspHttpConnection<'c>>;

fn read_body(req: &mut Req<'_, '_>) -> Result<Vec<u8>, EspIOError> {
    let mut body = Vec::new();
    let mut buf = [0u8; 256];
    while body.len() < MAX_BODY {
        let n = req.read(&mut buf)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(MAX_BODY);
    Ok(body)
}

fn respond(req: Req<'_, '_>, result: ApiResult) -> Result<(), EspIOError> {
    let mut resp = req.into_response(
        result.status(),
        None,
        &[("Content-Type", "application/json")],
    )?;
    resp.write_all(result.body().as_bytes())?;
    Ok(())
}

/// HTTP server for the fridge API and web UI.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Register every route and start listening.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new(config: &WebConfig, shared: Arc<Esp32SharedState>) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: config.port,
            max_uri_handlers: 24,
            stack_size: 10240,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;
        let api = HttpApiHandler::new(shared);

        macro_rules! get {
            ($path:expr, |$a:ident| $call:expr) => {{
                let $a = api.clone();
                server.fn_handler($path, Method::Get, move |req| respond(req, $call))?;
            }};
        }
        macro_rules! post {
            ($path:expr, |$a:ident, $body:ident| $call:expr) => {{
                let $a = api.clone();
                server.fn_handler($path, Method::Post, move |mut req| {
                    let $body = read_body(&mut req)?;
                    respond(req, $call)
                })?;
            }};
        }

        get!("/api/status", |a| a.handle_status());
        get!("/api/config", |a| a.handle_get_config());
        post!("/api/config", |a, body| a.handle_set_config(&body));
        get!("/api/logs", |a| a.handle_logs());
        post!("/api/system", |a, body| a.handle_system(&body));
        post!("/api/manual/compressor", |a, body| a.handle_manual_compressor(&body));
        post!("/api/manual/solenoid", |a, body| a.handle_manual_valve(&body));
        post!("/api/calibration/point1", |a, body| {
            a.handle_calibration_point(CalibrationSlot::Point1, &body)
        });
        post!("/api/calibration/point2", |a, body| {
            a.handle_calibration_point(CalibrationSlot::Point2, &body)
        });
        get!("/api/calibration/status", |a| a.handle_calibration_status());
        post!("/api/calibration/reset", |a, _body| a.handle_calibration_reset());
        get!("/api/ota/status", |a| a.handle_ota_status());
        get!("/api/ota/check", |a| a.handle_ota_check());
        post!("/api/ota/update", |a, body| a.handle_ota_update(&body));
        post!("/api/ota/auto-updates", |a, body| a.handle_auto_updates(&body));

        // GET / - Serve web UI (shared with desktop)
        server.fn_handler("/", Method::Get, move |req| {
            let html = include_str!("../../../www/index.html");
            let mut resp = req.into_response(200, None, &[("Content-Type", "text/html")])?;
            resp.write_all(html.as_bytes())?;
            Ok::<_, EspIOError>(())
        })?;

        log::info!("[HTTP] Server started on port {}", config.port);

        Ok(Self { _server: server })
    }
}
