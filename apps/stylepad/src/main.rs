mod app;
mod preview;
mod style;

use eframe::egui;
use sp_core::EditorConfig;
use sp_core::constants::DEFAULT_COMPONENT_SOURCE;
use sp_session::SessionStore;
use std::path::PathBuf;
use tracing::error;
use tracing::info;
use tracing::warn;

fn main() -> Result<(), eframe::Error> {
    sp_core::logging::init();

    let config = EditorConfig::load().unwrap_or_else(|error| {
        error!(%error, "falling back to default configuration");
        EditorConfig::default()
    });
    let source = initial_source(source_path_from_args());

    let session = SessionStore::with_source(config, source);
    info!(
        component = session.component_name().unwrap_or("-"),
        render_key = session.render_key(),
        "stylepad started"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Stylepad")
            .with_inner_size([1320.0, 840.0])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Stylepad",
        native_options,
        Box::new(|_cc| Ok(Box::new(app::StylepadApp::new(session)))),
    )
}

/// First positional argument, if any.
fn source_path_from_args() -> Option<PathBuf> {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with('-'))
        .map(PathBuf::from)
}

fn initial_source(path: Option<PathBuf>) -> String {
    let Some(path) = path else {
        return DEFAULT_COMPONENT_SOURCE.to_owned();
    };
    match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read component source, using template");
            DEFAULT_COMPONENT_SOURCE.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::initial_source;
    use sp_core::constants::DEFAULT_COMPONENT_SOURCE;
    use std::path::PathBuf;

    #[test]
    fn missing_file_falls_back_to_template() {
        assert_eq!(initial_source(None), DEFAULT_COMPONENT_SOURCE);
        assert_eq!(
            initial_source(Some(PathBuf::from("/definitely/not/here.tsx"))),
            DEFAULT_COMPONENT_SOURCE
        );
    }

    #[test]
    fn reads_the_given_file() {
        let path = std::env::temp_dir().join(format!("stylepad-{}.tsx", std::process::id()));
        let body = "export default () => <p>hi</p>;";
        if std::fs::write(&path, body).is_err() {
            return;
        }
        assert_eq!(initial_source(Some(path.clone())), body);
        let _ = std::fs::remove_file(path);
    }
}
