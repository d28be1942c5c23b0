//! Request routing for the gradebook
//!
//! Store failures never reach the client as errors. They are logged and the
//! route answers with its usual success shape.

use crate::form::{delete_roll, parse_form};
use crate::http::{Handler, HttpRequest, HttpResponse, Method, Status};
use crate::render;
use crate::store::RecordStore;
use std::fs;
use std::path::{Path, PathBuf};

/// The gradebook request handler
pub struct App<S: RecordStore> {
    store: S,
    index_path: PathBuf,
}

impl<S: RecordStore> App<S> {
    pub fn new(store: S, index_path: impl Into<PathBuf>) -> Self {
        App {
            store,
            index_path: index_path.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    fn index(&self) -> HttpResponse {
        match fs::read(&self.index_path) {
            Ok(page) => HttpResponse::html(Status::OK, page),
            Err(err) => {
                tracing::debug!(path = %self.index_path.display(), error = %err, "Index page unavailable");
                HttpResponse::text(Status::NOT_FOUND, "HTML file not found")
            }
        }
    }

    fn calculate(&mut self, request: &HttpRequest) -> HttpResponse {
        let record = parse_form(&request.body_text());

        if let Err(err) = self.store.append(&record) {
            tracing::warn!(error = %err, roll = record.roll, "Failed to save record");
        }

        let report = record.report();
        tracing::info!(
            name = %record.name,
            roll = record.roll,
            average = report.average,
            grade = %report.grade,
            "Processed"
        );

        json_or_failure(render::calculated(&record))
    }

    fn delete(&mut self, request: &HttpRequest) -> HttpResponse {
        let roll = delete_roll(&request.body_text()).unwrap_or(0);

        match self.store.delete_by_roll(roll) {
            Ok(removed) => tracing::info!(roll, removed, "Deleted records"),
            Err(err) => tracing::warn!(error = %err, roll, "Failed to delete records"),
        }

        HttpResponse::json(Status::OK, render::outcome(true))
    }

    fn records(&self) -> HttpResponse {
        let records = self.store.scan_all().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to read records");
            Vec::new()
        });

        json_or_failure(render::records(&records))
    }
}

fn json_or_failure(body: render::Result<String>) -> HttpResponse {
    match body {
        Ok(body) => HttpResponse::json(Status::OK, body),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to render response");
            HttpResponse::json(Status::INTERNAL_SERVER_ERROR, render::outcome(false))
        }
    }
}

/// Answer to a CORS preflight
fn preflight() -> HttpResponse {
    HttpResponse::new(Status::NO_CONTENT, "text/plain", Vec::new())
        .with_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", "Content-Type")
}

impl<S: RecordStore> Handler for App<S> {
    fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        match (request.method(), request.path()) {
            (Method::Options, _) => preflight(),
            (Method::Get, "/" | "/index.html") => self.index(),
            (Method::Get, "/api/records") => self.records(),
            (Method::Post, "/api/calculate") => self.calculate(request),
            (Method::Post, "/api/delete") => self.delete(request),
            _ => HttpResponse::text(Status::NOT_FOUND, "Not Found"),
        }
    }
}
