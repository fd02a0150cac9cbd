mod store;

pub use store::RemoteWriteError;
