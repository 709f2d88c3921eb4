//! Headless batch cropping.
//!
//! Drives a [`Session`] through a whole folder the way a user pressing
//! "Next" on every image would. Files that cannot be decoded are skipped
//! instead of exported.

use std::path::PathBuf;

use resizer_core::geometry::Size;
use resizer_core::{Session, SessionError};

/// Per-run knobs on top of the persisted configuration.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub container: Size,
    /// Zoom relative to fit, in percent. `None` keeps the configured default.
    pub zoom: Option<f64>,
    /// Tabs per image, including the primary one.
    pub tabs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            container: Size::new(800.0, 600.0),
            zoom: None,
            tabs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub exported: usize,
    pub skipped: usize,
    pub destination: Option<PathBuf>,
}

/// Step through every file of an already opened session.
pub fn run(session: &mut Session, options: &BatchOptions) -> Result<BatchSummary, SessionError> {
    session.resize_container(options.container);
    let destination = session.destination_folder();
    let mut summary = BatchSummary {
        exported: 0,
        skipped: 0,
        destination,
    };

    while session.current_index().is_some() {
        let blank = !session.tabs().primary().has_image();
        if !blank {
            prepare_tabs(session, options);
        }

        if session.can_next() {
            if blank {
                session.skip();
            } else {
                session.next()?;
            }
        } else {
            if blank {
                session.skip_current();
            }
            session.finish()?;
        }

        if blank {
            summary.skipped += 1;
        } else {
            summary.exported += 1;
        }
        log::debug!("{:.0}% done", session.progress() * 100.0);
    }

    log::info!(
        "batch finished: {} exported, {} skipped",
        summary.exported,
        summary.skipped
    );
    Ok(summary)
}

fn prepare_tabs(session: &mut Session, options: &BatchOptions) {
    let tabs = session.tabs_mut();
    if let Some(zoom) = options.zoom {
        tabs.primary_mut()
            .viewport_mut()
            .set_relative_zoom_percent(zoom);
    }
    while tabs.len() < options.tabs.max(1) {
        tabs.add_tab();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resizer_core::encode::write_png;
    use resizer_core::{Config, DecodedImage};

    fn source_folder(dir: &std::path::Path, count: usize) -> PathBuf {
        let src = dir.join("src");
        std::fs::create_dir(&src).unwrap();
        for i in 0..count {
            let image = DecodedImage::new(30, 20, vec![128; 30 * 20 * 4]);
            write_png(&image, &src.join(format!("{i:02}.png"))).unwrap();
        }
        src
    }

    fn session(src: &std::path::Path) -> Session {
        let mut config = Config::default();
        config.cropper_width = 8;
        config.cropper_height = 8;
        let mut session = Session::new(&config);
        assert!(session.open_source_folder(src));
        session
    }

    #[test]
    fn test_run_exports_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_folder(dir.path(), 3);
        let mut session = session(&src);

        let summary = run(&mut session, &BatchOptions::default()).unwrap();

        assert_eq!(summary.exported, 3);
        assert_eq!(summary.skipped, 0);
        let out = dir.path().join("src_cropped");
        assert_eq!(summary.destination, Some(out.clone()));
        for i in 0..3 {
            assert!(out.join(format!("{i:06}-000.png")).exists());
        }
        assert!(session.files().is_empty());
    }

    #[test]
    fn test_run_with_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_folder(dir.path(), 2);
        let mut session = session(&src);
        let options = BatchOptions {
            zoom: Some(150.0),
            tabs: 3,
            ..BatchOptions::default()
        };

        run(&mut session, &options).unwrap();

        let out = dir.path().join("src_cropped");
        for i in 0..2 {
            for tab in 0..3 {
                assert!(out.join(format!("{i:06}-{tab:03}.png")).exists());
            }
        }
    }

    #[test]
    fn test_run_skips_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_folder(dir.path(), 1);
        std::fs::write(src.join("01.png"), b"not a png").unwrap();
        let mut session = session(&src);

        let summary = run(&mut session, &BatchOptions::default()).unwrap();

        assert_eq!(summary.exported, 1);
        assert_eq!(summary.skipped, 1);
        let out = dir.path().join("src_cropped");
        assert!(out.join("000000-000.png").exists());
        assert!(!out.join("000001-000.png").exists());
    }

    #[test]
    fn test_run_skips_undecodable_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_folder(dir.path(), 0);
        std::fs::write(src.join("00.png"), b"not a png").unwrap();
        let mut session = session(&src);

        let summary = run(&mut session, &BatchOptions::default()).unwrap();

        assert_eq!(summary.exported, 0);
        assert_eq!(summary.skipped, 1);
        assert!(!dir.path().join("src_cropped/000000-000.png").exists());
        assert!(session.files().is_empty());
    }
}
