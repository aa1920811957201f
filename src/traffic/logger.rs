//! The traffic logger: ID allocation, gating, rendering and appending.

use std::path::Path;

use axum::http::{Request, Response};
use chrono::Local;

use crate::config::TrafficLogConfig;
use crate::traffic::dump::{self, WireBody};
use crate::traffic::error::{DumpError, TrafficLogError};
use crate::traffic::frame::{render_block, Direction, Kind};
use crate::traffic::id::{IdAllocator, TransactionId};
use crate::traffic::sink::{resolve_name, Sink};

/// Request/response traffic logger shared by all in-flight transactions.
///
/// Request entry points allocate a fresh [`TransactionId`]; the matching
/// response entry point takes that ID back so both blocks carry it.
/// Allocation happens whether or not anything is written.
#[derive(Debug)]
pub struct TrafficLogger {
    config: TrafficLogConfig,
    sink: Option<Sink>,
    ids: IdAllocator,
}

impl TrafficLogger {
    /// Create a logger, opening the sink if a file name is configured.
    ///
    /// Fails with [`TrafficLogError::Configuration`] if the sink cannot be
    /// opened; no logger is returned in that case.
    pub fn new(config: TrafficLogConfig) -> Result<Self, TrafficLogError> {
        let sink = if config.file_name.is_empty() {
            None
        } else {
            let path = resolve_name(&config.file_name, Local::now());
            match Sink::open(path) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to open HTTP traffic log");
                    return Err(e);
                }
            }
        };

        tracing::info!(
            enabled = config.enabled,
            include_body = config.include_body,
            path = ?sink.as_ref().map(|s| s.path().display().to_string()),
            "HTTP traffic logger ready"
        );

        Ok(Self {
            config,
            sink,
            ids: IdAllocator::new(),
        })
    }

    /// Issue the next transaction ID.
    pub fn next_id(&self) -> TransactionId {
        self.ids.next_id()
    }

    /// ID to thread through to the response after a request entry point.
    ///
    /// Serialization failures still carry their allocated ID; the failure
    /// itself has already been reported.
    pub fn id_from(&self, result: Result<TransactionId, TrafficLogError>) -> TransactionId {
        match result {
            Ok(id) => id,
            Err(e) => e.transaction_id().unwrap_or_else(|| self.next_id()),
        }
    }

    /// Resolved sink path, if a sink was configured.
    pub fn sink_path(&self) -> Option<&Path> {
        self.sink.as_ref().map(Sink::path)
    }

    pub fn config(&self) -> &TrafficLogConfig {
        &self.config
    }

    /// Release the sink. Safe to call repeatedly or without a sink.
    pub fn close(&self) {
        if let Some(sink) = &self.sink {
            sink.close();
        }
    }

    /// Whether a block of this direction and kind would be written.
    pub fn is_logging(&self, direction: Direction, kind: Kind) -> bool {
        self.gate(direction, kind).is_some()
    }

    fn gate(&self, direction: Direction, kind: Kind) -> Option<&Sink> {
        let cfg = &self.config;
        let direction_enabled = match (direction, kind) {
            (Direction::Inbound, Kind::Request) => cfg.log_inbound_request,
            (Direction::Inbound, Kind::Response) => cfg.log_inbound_response,
            (Direction::Outbound, Kind::Request) => cfg.log_outbound_request,
            (Direction::Outbound, Kind::Response) => cfg.log_outbound_response,
        };
        if cfg.enabled && direction_enabled {
            self.sink.as_ref()
        } else {
            None
        }
    }

    /// Render one transaction and append it as a single block.
    fn record<F>(
        &self,
        direction: Direction,
        kind: Kind,
        id: TransactionId,
        render: F,
    ) -> Result<(), TrafficLogError>
    where
        F: FnOnce(bool) -> Result<Vec<u8>, DumpError>,
    {
        let Some(sink) = self.gate(direction, kind) else {
            return Ok(());
        };

        let dump = render(self.config.include_body).map_err(|source| {
            let err = TrafficLogError::Serialization {
                id,
                direction,
                kind,
                source,
            };
            tracing::error!(
                transaction_id = %id,
                direction = %direction,
                kind = %kind,
                error = %err,
                "Failed to dump HTTP traffic"
            );
            err
        })?;

        sink.append(&render_block(direction, kind, id, &dump));
        Ok(())
    }

    /// Log a request this process is about to send. Returns its new ID.
    ///
    /// On a serialization error the ID is still allocated and is available
    /// through [`TrafficLogError::transaction_id`].
    pub fn log_outbound_request<B: WireBody>(&self, req: &Request<B>) -> Result<TransactionId, TrafficLogError> {
        let id = self.next_id();
        self.record(
            Direction::Outbound,
            Kind::Request,
            id,
            |body| dump::outbound_request(req, body),
        )?;
        Ok(id)
    }

    /// Log the response to an outbound request logged under `id`.
    pub fn log_outbound_response<B: WireBody>(
        &self,
        resp: &Response<B>,
        id: TransactionId,
    ) -> Result<(), TrafficLogError> {
        self.record(
            Direction::Outbound,
            Kind::Response,
            id,
            |body| dump::response(resp, body),
        )
    }

    /// Log a request received by this server. Returns its new ID.
    ///
    /// With body logging on, the caller must hand over a request whose body
    /// is still readable (e.g. buffered and re-attached).
    pub fn log_inbound_request<B: WireBody>(&self, req: &Request<B>) -> Result<TransactionId, TrafficLogError> {
        let id = self.next_id();
        self.record(
            Direction::Inbound,
            Kind::Request,
            id,
            |body| dump::inbound_request(req, body),
        )?;
        Ok(id)
    }

    /// Log the response this server produced for the request logged under `id`.
    ///
    /// Takes already-flattened parts since the response object is usually
    /// gone by the time the bytes are known.
    pub fn log_inbound_response<I, K, V>(
        &self,
        headers: I,
        body: &[u8],
        status: u16,
        id: TransactionId,
    ) -> Result<(), TrafficLogError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        self.record(
            Direction::Inbound,
            Kind::Response,
            id,
            |include_body| Ok(dump::flattened_response(headers, body, status, include_body)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> TrafficLogConfig {
        TrafficLogConfig {
            enabled: true,
            include_body: true,
            file_name: dir.path().join("access_%s.log").display().to_string(),
            ..TrafficLogConfig::default()
        }
    }

    fn contents(logger: &TrafficLogger) -> String {
        std::fs::read_to_string(logger.sink_path().unwrap()).unwrap()
    }

    #[test]
    fn inbound_request_then_response() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(config_in(&dir)).unwrap();

        let req = Request::builder()
            .uri("/health")
            .header("x-test", "1")
            .body(())
            .unwrap();
        let id = logger.log_inbound_request(&req).unwrap();
        assert_eq!(id.as_u64(), 1);

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        logger.log_inbound_response(&headers, b"ok", 200, id).unwrap();

        let text = contents(&logger);
        assert!(text.contains("In Request '1' BEGIN"));
        assert!(text.lines().any(|l| l.contains("GET /health")));
        assert!(text.lines().any(|l| l.contains("X-Test: 1")));
        assert!(text.contains("In Request '1' End"));
        assert!(text.contains("In Response '1' BEGIN"));
        assert!(text.contains("HTTP 200 OK\nContent-Type: text/plain\n\nok\n"));
        assert!(text.contains("In Response '1' End"));
    }

    #[test]
    fn sink_name_placeholder_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(config_in(&dir)).unwrap();

        let name = logger.sink_path().unwrap().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("access_"));
        assert!(!name.contains("%s"));
        assert_eq!(name.len(), "access_YYYY_MM_DD_HHMMSS.log".len());
    }

    #[test]
    fn disabled_logger_writes_nothing_but_allocates() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(TrafficLogConfig {
            enabled: false,
            ..config_in(&dir)
        })
        .unwrap();

        let req = Request::builder().uri("http://h/x").body(()).unwrap();
        for expected in 1..=5 {
            assert_eq!(logger.log_inbound_request(&req).unwrap().as_u64(), expected * 2 - 1);
            assert_eq!(logger.log_outbound_request(&req).unwrap().as_u64(), expected * 2);
        }
        let none: [(&str, &str); 0] = [];
        logger.log_inbound_response(none, b"x", 200, TransactionId::from_u64(1)).unwrap();

        assert_eq!(contents(&logger), "");
    }

    #[test]
    fn no_sink_configured_is_a_no_op() {
        let logger = TrafficLogger::new(TrafficLogConfig {
            enabled: true,
            ..TrafficLogConfig::default()
        })
        .unwrap();

        assert!(logger.sink_path().is_none());
        let req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(logger.log_inbound_request(&req).unwrap().as_u64(), 1);
        logger.close();
        logger.close();
    }

    #[test]
    fn body_excluded_when_flag_off() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(TrafficLogConfig {
            include_body: false,
            ..config_in(&dir)
        })
        .unwrap();

        let req = Request::builder()
            .method("POST")
            .uri("http://backend:1/submit")
            .body("top-secret-payload")
            .unwrap();
        let id = logger.log_outbound_request(&req).unwrap();

        let resp = Response::builder().status(201).body("top-secret-reply").unwrap();
        logger.log_outbound_response(&resp, id).unwrap();

        let headers = [("X-Kind", "flat")];
        logger.log_inbound_response(headers, b"top-secret-flat", 200, id).unwrap();

        let text = contents(&logger);
        assert!(text.contains("Out Request '1' BEGIN"));
        assert!(text.contains("Out Request '1' END"));
        assert!(text.contains("Out Response '1' End"));
        assert!(!text.contains("top-secret"));
    }

    #[test]
    fn direction_flags_gate_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(TrafficLogConfig {
            log_inbound_request: false,
            log_outbound_response: false,
            ..config_in(&dir)
        })
        .unwrap();

        let req = Request::builder().uri("http://h/").body(()).unwrap();
        let in_id = logger.log_inbound_request(&req).unwrap();
        let out_id = logger.log_outbound_request(&req).unwrap();
        let resp = Response::builder().body(()).unwrap();
        logger.log_outbound_response(&resp, out_id).unwrap();
        let none: [(&str, &str); 0] = [];
        logger.log_inbound_response(none, b"", 204, in_id).unwrap();

        let text = contents(&logger);
        assert!(!text.contains("In Request"));
        assert!(text.contains("Out Request '2' BEGIN"));
        assert!(!text.contains("Out Response"));
        assert!(text.contains("In Response '1' BEGIN"));
    }

    #[test]
    fn serialization_failure_keeps_allocated_id() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(config_in(&dir)).unwrap();

        let relative = Request::builder().uri("/no-host").body(()).unwrap();
        let err = logger.log_outbound_request(&relative).unwrap_err();
        assert_eq!(err.transaction_id(), Some(TransactionId::from_u64(1)));
        assert!(matches!(err, TrafficLogError::Serialization { kind: Kind::Request, .. }));

        let ok = Request::builder().uri("http://h/").body(()).unwrap();
        assert_eq!(logger.log_outbound_request(&ok).unwrap().as_u64(), 2);
        assert!(!contents(&logger).contains("'1'"));
    }

    #[test]
    fn unwritable_sink_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("traffic.log");
        let err = TrafficLogger::new(TrafficLogConfig {
            enabled: true,
            file_name: path.display().to_string(),
            ..TrafficLogConfig::default()
        })
        .unwrap_err();

        assert!(matches!(err, TrafficLogError::Configuration { .. }));
        assert!(err.to_string().contains("no-such-dir"));
    }

    #[test]
    fn is_logging_needs_switch_flag_and_sink() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(TrafficLogConfig {
            log_outbound_request: false,
            ..config_in(&dir)
        })
        .unwrap();
        assert!(logger.is_logging(Direction::Inbound, Kind::Request));
        assert!(!logger.is_logging(Direction::Outbound, Kind::Request));

        let sinkless = TrafficLogger::new(TrafficLogConfig {
            file_name: String::new(),
            ..config_in(&dir)
        })
        .unwrap();
        assert!(!sinkless.is_logging(Direction::Inbound, Kind::Request));
    }

    #[test]
    fn writes_after_close_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TrafficLogger::new(config_in(&dir)).unwrap();
        logger.close();

        let req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(logger.log_inbound_request(&req).unwrap().as_u64(), 1);
        assert_eq!(contents(&logger), "");
    }
}
