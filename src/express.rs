use crate::application::App;
use crate::router::Router;

mod logging;

pub use logging::RequestLogger;

pub fn app() -> App {
    App::default()
}

pub fn router() -> Router {
    Router::default()
}
