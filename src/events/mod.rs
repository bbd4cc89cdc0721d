//! Events for AlumniConnect.
//!
//! Members browse upcoming events and register for them; administrators
//! create and delete events through [`crate::admin`].

mod service;
mod types;

pub use service::EventService;
pub use types::{
    Event, EventRegistration, NewEvent, NewEventRegistration, MAX_EVENT_DESCRIPTION_LENGTH,
    MAX_EVENT_TITLE_LENGTH,
};
