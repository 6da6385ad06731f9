mod engagement_handler;

pub use engagement_handler::*;
