#![allow(dead_code)]

pub mod post_server;
pub mod stub;
