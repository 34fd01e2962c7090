//! Shared test utilities

#![allow(dead_code)]

pub mod mocks;
