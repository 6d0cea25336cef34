pub mod check;
pub mod plan;
pub mod stack;

use std::path::PathBuf;

use gridstack_common::error::GridstackResult;
use gridstack_grid_model::{CanvasPlan, GridSpec};
use gridstack_layout_core::plan_layout;
use gridstack_render_engine::{probe_items, GeometryProber};

use crate::args::LayoutSettings;

/// Inputs discovered, probed and laid out.
#[derive(Debug)]
pub struct Prepared {
    pub spec: GridSpec,
    pub plan: CanvasPlan,

    /// Every discovered path, including those past the grid capacity.
    pub discovered: Vec<PathBuf>,
}

/// Validate, discover, probe and plan.
///
/// Explicit rows, cols and cell sizes are checked before the input
/// directory is read, and inputs beyond the grid capacity are never probed.
pub fn prepare(settings: &LayoutSettings, prober: &dyn GeometryProber) -> GridstackResult<Prepared> {
    settings.grid_spec(1).validate()?;

    let discovered = settings.discovery.discover(&settings.dir)?;
    let spec = settings.grid_spec(discovered.len());
    spec.validate()?;

    let kept = &discovered[..discovered.len().min(spec.capacity())];
    if kept.len() < discovered.len() {
        tracing::warn!(
            capacity = spec.capacity(),
            discovered = discovered.len(),
            "More inputs than cells, extra inputs are dropped"
        );
    }

    let items = probe_items(prober, kept)?;
    let planned = plan_layout(&spec, &items)?;
    let plan = CanvasPlan {
        dropped: discovered.len() - planned.len(),
        ..planned
    };

    tracing::info!(
        rows = spec.rows,
        cols = spec.cols,
        fit_mode = %spec.fit_mode,
        canvas_width = plan.width,
        canvas_height = plan.height,
        items = plan.len(),
        "Layout planned"
    );

    Ok(Prepared {
        spec,
        plan,
        discovered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use gridstack_common::config::AppConfig;
    use gridstack_common::error::GridstackError;
    use gridstack_grid_model::{FitMode, Size};

    use crate::args::LayoutArgs;

    /// Every file probes as 40x30; records what was probed.
    #[derive(Default)]
    struct RecordingProber(Mutex<Vec<PathBuf>>);

    impl GeometryProber for RecordingProber {
        fn probe(&self, path: &Path) -> GridstackResult<Size> {
            self.0.lock().unwrap().push(path.to_path_buf());
            Ok(Size::new(40, 30))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn settings(dir: &Path, rows: Option<u32>, cols: Option<u32>) -> LayoutSettings {
        let args = LayoutArgs {
            dir: Some(dir.to_path_buf()),
            input_dir: None,
            rows,
            cols,
            fit_mode: Some(FitMode::Cover),
            cell_width: None,
            cell_height: None,
            gutter: Some(2),
            align: None,
            bg_color: None,
            exts: Some(vec!["png".into()]),
            limit: None,
            recursive: false,
        };
        args.resolve(&AppConfig::default()).unwrap()
    }

    fn scratch(name: &str, count: usize) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridstack-prepare-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            std::fs::write(dir.join(format!("{i:02}.png")), b"x").unwrap();
        }
        dir
    }

    #[test]
    fn test_inputs_past_capacity_are_not_probed() {
        let dir = scratch("capacity", 7);
        let prober = RecordingProber::default();
        let prepared = prepare(&settings(&dir, Some(2), Some(3)), &prober).unwrap();

        assert_eq!(prepared.discovered.len(), 7);
        assert_eq!(prepared.plan.len(), 6);
        assert_eq!(prepared.plan.dropped, 1);
        assert_eq!(prepared.plan.size(), Size::new(3 * 40 + 2 * 2, 2 * 30 + 2));

        let probed = prober.0.lock().unwrap();
        assert_eq!(probed.len(), 6);
        assert!(!probed.contains(&dir.join("06.png")));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_shape_is_inferred_from_input_count() {
        let dir = scratch("shape", 5);
        let prepared = prepare(&settings(&dir, None, None), &RecordingProber::default()).unwrap();
        assert_eq!((prepared.spec.rows, prepared.spec.cols), (2, 3));
        assert_eq!(prepared.plan.dropped, 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_grid_fails_before_reading_inputs() {
        let missing = std::env::temp_dir().join(format!("gridstack-prepare-{}-missing", std::process::id()));
        let prober = RecordingProber::default();

        let zero_rows = prepare(&settings(&missing, Some(0), Some(2)), &prober).unwrap_err();
        assert!(matches!(zero_rows, GridstackError::InvalidConfig { .. }));
        assert_eq!(zero_rows.exit_code(), 2);

        let mut thin_cells = settings(&missing, None, None);
        thin_cells.cell_width = Some(1);
        let err = prepare(&thin_cells, &prober).unwrap_err();
        assert!(matches!(err, GridstackError::InvalidConfig { .. }));

        let fine = prepare(&settings(&missing, Some(2), Some(2)), &prober).unwrap_err();
        assert!(matches!(fine, GridstackError::FileNotFound { .. }));
        assert!(prober.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_grid_fails_before_probing() {
        let dir = scratch("invalid", 2);
        let prober = RecordingProber::default();
        let err = prepare(&settings(&dir, Some(0), Some(2)), &prober).unwrap_err();

        assert!(matches!(err, GridstackError::InvalidConfig { .. }));
        assert!(prober.0.lock().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
