pub mod blade_shell;
pub mod intent_client;

pub use blade_shell::AppState;
pub use intent_client::IntentClient;
