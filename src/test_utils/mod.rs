//! Test utilities: a scripted driver for exercising the accessor without a database.

pub mod mock;

pub use mock::{
    MetadataMode, MockConnection, MockDatabase, MockEvent, MockFailure, MockResult, MockScript,
};
