pub mod config;
pub mod error;
pub mod forward;
pub mod logger;
pub mod server;

use std::any::Any;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic payload".to_string()
    }
}

/// Route panics through the logger before the default hook runs.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let message = panic_message(panic_info.payload());

        let location = if let Some(location) = panic_info.location() {
            format!("{}:{}:{}", location.file(), location.line(), location.column())
        } else {
            "Unknown location".to_string()
        };

        crate::logger::error(
            "panic",
            &format!(
                "PANIC occurred: message='{}', location='{}', backtrace available via RUST_BACKTRACE=1",
                message, location
            ),
        );

        default_hook(panic_info);
    }));
}

/// Start the relay with the given settings and serve until shutdown.
pub async fn run(settings: config::Settings) -> error::AppResult<()> {
    install_panic_hook();
    logger::info("app", "Relay starting");
    server::serve(settings).await
}
