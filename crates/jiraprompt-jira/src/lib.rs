//! # jiraprompt-jira
//!
//! Turns a page URL into plain issue text: classify the URL, fetch either
//! the REST representation or the XML export, flatten, and redact.

pub mod client;
pub mod html;
pub mod locator;
pub mod rest;
pub mod xml;

pub use client::JiraClient;
pub use locator::{classify, IssueLocator};
