mod app;
mod run;
mod state;

pub use app::create_app;
pub use run::serve_until_shutdown;
pub use state::AppState;
