#![allow(dead_code)]

pub mod member;
