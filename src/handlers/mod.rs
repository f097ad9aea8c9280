pub mod pages;
pub mod webhook;
