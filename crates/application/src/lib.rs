//! Application services and ports for the front-desk client.

#![forbid(unsafe_code)]

mod clock;
mod collection_ports;
mod list_controller;
mod record_form_pipeline;
mod session_service;

pub use clock::{Clock, DebounceTimer, TokioClock};
pub use collection_ports::{
    AuthGateway, IssuedToken, LoginCredentials, ReferenceDataGateway, RemoteCollectionGateway,
};
pub use list_controller::{
    ConfirmedRemoval, DEFAULT_SEARCH_DEBOUNCE, FetchPhase, FetchStatus, ListController,
    ListControllerConfig, ListState, PendingRemoval,
};
pub use record_form_pipeline::{RecordFormPipeline, SubmissionOutcome};
pub use session_service::SessionService;
