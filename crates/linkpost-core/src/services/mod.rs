//! Async services shared by front ends

mod store;

pub use store::PostStore;
