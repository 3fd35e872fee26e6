mod adapter;

pub use adapter::GenericAdapter;
