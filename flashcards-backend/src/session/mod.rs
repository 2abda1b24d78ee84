mod flash;
mod store;

pub use flash::FlashSession;
pub use store::SessionStore;
