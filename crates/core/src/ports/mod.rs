mod dispatcher;
mod event_source;
mod repository;

pub use dispatcher::*;
pub use event_source::*;
pub use repository::*;
