use image::{Rgba, RgbaImage};
use pathgrid::{Canvas, Cell};

const PATH_COLOR: Rgba<u8> = Rgba([0xe7, 0x4c, 0x3c, 0xff]);
const START_COLOR: Rgba<u8> = Rgba([0x2e, 0xcc, 0x71, 0xff]);
const END_COLOR: Rgba<u8> = Rgba([0x34, 0x98, 0xdb, 0xff]);

fn center(cell: Cell) -> (f64, f64) {
    (cell.x as f64 + 0.5, cell.y as f64 + 0.5)
}

/// The input bitmap with the path stroked over it and both endpoints marked.
///
/// Line and marker sizes scale with the bitmap width so they stay visible on large images.
pub(crate) fn render(canvas: &Canvas, path: &[Cell], start: Cell, end: Cell) -> RgbaImage {
    let mut canvas = canvas.clone();
    let width = canvas.width() as f64;
    let line_radius = (width / 400.0).max(0.5);
    let marker_radius = (width / 150.0).max(2.5);

    for pair in path.windows(2) {
        canvas.paint_segment(center(pair[0]), center(pair[1]), line_radius, PATH_COLOR);
    }

    for (cell, color) in [(start, START_COLOR), (end, END_COLOR)] {
        canvas.paint_segment(center(cell), center(cell), marker_radius, color);
    }

    canvas.into_image()
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_render_marks_path_and_endpoints() {
        let canvas = Canvas::blank(12, 3).unwrap();
        let path: Vec<Cell> = (0..12).map(|x| Cell::new(x, 1)).collect();

        let img = render(&canvas, &path, Cell::new(0, 1), Cell::new(11, 1));

        assert_eq!(img.get_pixel(0, 1), &START_COLOR);
        assert_eq!(img.get_pixel(11, 1), &END_COLOR);
        assert_eq!(img.get_pixel(6, 1), &PATH_COLOR);
        // the input is untouched above and below the line
        assert_eq!(img.get_pixel(6, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_render_without_path() {
        let canvas = Canvas::blank(12, 12).unwrap();

        let img = render(&canvas, &[], Cell::new(1, 1), Cell::new(10, 10));

        assert_eq!(img.get_pixel(1, 1), &START_COLOR);
        assert_eq!(img.get_pixel(10, 10), &END_COLOR);
        assert_eq!(img.get_pixel(6, 6), &Rgba([255, 255, 255, 255]));
    }
}
