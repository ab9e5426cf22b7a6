pub mod calendar;
pub mod error;
pub mod rest;
pub mod schema;
pub mod tools;

pub use calendar::{calendar_entries, CalendarEntry};
pub use error::ToolError;
pub use rest::router;
pub use schema::{tool_definitions, ToolDefinition};
pub use tools::{
    DateRange, EventFilter, EventHit, GraphHit, GraphQuery, KnowledgeBase, PeopleQuery, PersonHit, ResearchHit,
    ResearchQuery, ToolName,
};
