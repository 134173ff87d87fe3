#![allow(dead_code)]

pub mod ecodms_mock;
pub mod socket_guard;
