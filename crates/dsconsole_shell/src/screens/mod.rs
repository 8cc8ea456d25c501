//! Configuration screens composed from components and admin tool commands

pub mod member_of;

pub use member_of::{EntryAction, MemberOfConfig, MemberOfField, MemberOfScreen, PluginEntry};
