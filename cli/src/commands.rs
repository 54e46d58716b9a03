use std::{fs, io::Write};

use anyhow::{bail, Context};
use log::{debug, info};
use pathgrid::{solve as find_path, Canvas, Cell, Grid, Settings};
use serde::Serialize;

use crate::{overlay, InputArgs, SolveArgs};

/// Settings from `--config`, with `--threshold` taking precedence
pub(crate) fn load_settings(args: &InputArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Settings::default(),
    };

    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    debug!("using {:?}", settings);
    Ok(settings)
}

pub(crate) fn load_canvas(args: &InputArgs) -> anyhow::Result<Canvas> {
    let path = &args.image;
    let canvas = match args.raw {
        Some(size) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Canvas::from_raw(size.width, size.height, bytes)
                .with_context(|| format!("invalid raw pixels in {}", path.display()))?
        }
        None => {
            Canvas::open(path).with_context(|| format!("failed to open {}", path.display()))?
        }
    };

    info!(
        "loaded {} ({}x{})",
        path.display(),
        canvas.width(),
        canvas.height()
    );
    Ok(canvas)
}

fn load_grid(args: &InputArgs) -> anyhow::Result<(Canvas, Grid)> {
    let settings = load_settings(args)?;
    let canvas = load_canvas(args)?;
    let grid = canvas.rasterize(settings.threshold)?;
    Ok((canvas, grid))
}

#[derive(Serialize)]
struct GridReport {
    width: usize,
    height: usize,
    passable: usize,
    rows: Vec<String>,
}

impl GridReport {
    fn new(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            passable: grid.passable_count(),
            rows: grid
                .rows()
                .map(|row| row.iter().map(|&p| if p { '.' } else { 'X' }).collect())
                .collect(),
        }
    }
}

pub(crate) fn rasterize(args: &InputArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let (_, grid) = load_grid(args)?;

    if args.json {
        serde_json::to_writer(&mut *out, &GridReport::new(&grid))?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "{}x{}, {} passable",
            grid.width(),
            grid.height(),
            grid.passable_count()
        )?;
        write!(out, "{}", grid)?;
    }
    Ok(())
}

fn check_endpoint(grid: &Grid, name: &str, cell: Cell) -> anyhow::Result<()> {
    if !grid.contains(cell) {
        bail!(
            "{} {} is outside the {}x{} grid",
            name,
            cell,
            grid.width(),
            grid.height()
        );
    }
    if !grid.is_passable(cell) {
        bail!("{} {} is a wall", name, cell);
    }
    Ok(())
}

pub(crate) fn solve(args: &SolveArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let (canvas, grid) = load_grid(&args.input)?;
    let (start, end) = (args.start.0, args.end.0);

    check_endpoint(&grid, "start", start)?;
    check_endpoint(&grid, "end", end)?;

    let result = find_path(&grid, start, end)?;

    if args.input.json {
        serde_json::to_writer(&mut *out, &result)?;
        writeln!(out)?;
    } else {
        match &result.path {
            Some(path) => {
                let cells: Vec<String> = path.iter().map(Cell::to_string).collect();
                writeln!(out, "path: {}", cells.join(" -> "))?;
                writeln!(out, "steps: {}", path.len())?;
            }
            None => writeln!(out, "path: none")?,
        }
        writeln!(out, "visited: {}", result.visited_count)?;
    }

    if let Some(target) = &args.overlay {
        let path = result.path.as_deref().unwrap_or_default();
        overlay::render(&canvas, path, start, end)
            .save(target)
            .with_context(|| format!("failed to write overlay {}", target.display()))?;
        info!("wrote overlay to {}", target.display());
    }

    Ok(())
}

#[cfg(test)]
mod test {

    use std::path::{Path, PathBuf};

    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    use super::*;
    use crate::{CellArg, RawSize};

    /// Writes a PNG where 'X' is a black pixel and anything else is white
    fn write_maze(dir: &Path, rows: &[&str]) -> PathBuf {
        let width = rows[0].len() as u32;
        let mut img = RgbImage::from_pixel(width, rows.len() as u32, Rgb([255, 255, 255]));
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == 'X' {
                    img.put_pixel(x as u32, y as u32, Rgb([0, 0, 0]));
                }
            }
        }
        let path = dir.join("maze.png");
        img.save(&path).unwrap();
        path
    }

    fn input(image: PathBuf) -> InputArgs {
        InputArgs {
            image,
            raw: None,
            threshold: None,
            config: None,
            json: false,
        }
    }

    fn solve_args(image: PathBuf, start: (usize, usize), end: (usize, usize)) -> SolveArgs {
        SolveArgs {
            input: input(image),
            start: CellArg(Cell::new(start.0, start.1)),
            end: CellArg(Cell::new(end.0, end.1)),
            overlay: None,
        }
    }

    fn run_solve(args: &SolveArgs) -> anyhow::Result<String> {
        let mut out = Vec::new();
        solve(args, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_rasterize_text() {
        let dir = TempDir::new().unwrap();
        let image = write_maze(dir.path(), &["  X", "X  "]);

        let mut out = Vec::new();
        rasterize(&input(image), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "3x2, 4 passable\n  X\nX  \n"
        );
    }

    #[test]
    fn test_rasterize_json() {
        let dir = TempDir::new().unwrap();
        let mut args = input(write_maze(dir.path(), &[" X", "  "]));
        args.json = true;

        let mut out = Vec::new();
        rasterize(&args, &mut out).unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["width"], 2);
        assert_eq!(report["height"], 2);
        assert_eq!(report["passable"], 3);
        assert_eq!(report["rows"], serde_json::json!([".X", ".."]));
    }

    #[test]
    fn test_solve_text() {
        let dir = TempDir::new().unwrap();
        let image = write_maze(dir.path(), &["   ", " X ", "   "]);

        let out = run_solve(&solve_args(image, (0, 0), (2, 0))).unwrap();

        assert_eq!(
            out,
            "path: (0, 0) -> (1, 0) -> (2, 0)\nsteps: 3\nvisited: 5\n"
        );
    }

    #[test]
    fn test_solve_unreachable() {
        let dir = TempDir::new().unwrap();
        let image = write_maze(dir.path(), &["   ", "XXX", "   "]);

        let out = run_solve(&solve_args(image, (0, 0), (2, 2))).unwrap();
        assert_eq!(out, "path: none\nvisited: 3\n");
    }

    #[test]
    fn test_solve_json() {
        let dir = TempDir::new().unwrap();
        let mut args = solve_args(write_maze(dir.path(), &["  "]), (0, 0), (1, 0));
        args.input.json = true;

        let out = run_solve(&args).unwrap();
        let result: pathgrid::SearchResult = serde_json::from_str(&out).unwrap();

        assert_eq!(result.path, Some(vec![Cell::new(0, 0), Cell::new(1, 0)]));
        assert_eq!(result.visited_count, 2);
    }

    #[test]
    fn test_solve_rejects_bad_endpoints() {
        let dir = TempDir::new().unwrap();
        let image = write_maze(dir.path(), &[" X", "  "]);

        let wall = run_solve(&solve_args(image.clone(), (0, 0), (1, 0))).unwrap_err();
        assert!(wall.to_string().contains("wall"));

        let outside = run_solve(&solve_args(image, (0, 0), (5, 0))).unwrap_err();
        assert!(outside.to_string().contains("outside"));
    }

    #[test]
    fn test_threshold_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{ "threshold": 10 }"#).unwrap();

        let mut args = input(dir.path().join("unused.png"));
        args.config = Some(config);
        assert_eq!(load_settings(&args).unwrap().threshold, 10);

        args.threshold = Some(200);
        assert_eq!(load_settings(&args).unwrap().threshold, 200);
    }

    #[test]
    fn test_raw_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("maze.rgb");
        fs::write(&path, [0, 0, 0, 255, 255, 255]).unwrap();

        let mut args = input(path);
        args.raw = Some(RawSize {
            width: 2,
            height: 1,
        });
        let mut out = Vec::new();
        rasterize(&args, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2x1, 1 passable\nX \n");

        args.raw = Some(RawSize {
            width: 3,
            height: 1,
        });
        let err = rasterize(&args, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<pathgrid::Error>(),
            Some(pathgrid::Error::InvalidDimensions { len: 6, .. })
        ));
    }

    #[test]
    fn test_overlay_is_written() {
        let dir = TempDir::new().unwrap();
        let mut args = solve_args(write_maze(dir.path(), &["    ", "    "]), (0, 0), (3, 1));
        let target = dir.path().join("overlay.png");
        args.overlay = Some(target.clone());

        run_solve(&args).unwrap();

        let written = image::open(&target).unwrap();
        assert_eq!((written.width(), written.height()), (4, 2));
    }
}
