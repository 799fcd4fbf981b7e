//! SVG chart output for training artifacts.
//!
//! Writes the post-training confusion matrix as a self-contained SVG
//! heatmap that can be opened in any browser or dropped into a report.

use std::fs;
use std::path::Path;

use crate::utils::metrics::ConfusionMatrix;

const CELL_SIZE: f64 = 44.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 70.0;

const COLOR_TEXT: &str = "#2c3e50";
const COLOR_GRID: &str = "#bdc3c7";

/// Heatmap cell fill: white at 0, saturated blue at the row maximum.
fn cell_color(intensity: f64) -> String {
    let t = intensity.clamp(0.0, 1.0);
    // Interpolate white (255,255,255) -> blue (41,128,185)
    let r = (255.0 + (41.0 - 255.0) * t) as u8;
    let g = (255.0 + (128.0 - 255.0) * t) as u8;
    let b = (255.0 + (185.0 - 255.0) * t) as u8;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Generate a confusion-matrix heatmap SVG and write it to `output_path`.
pub fn generate_confusion_heatmap(
    cm: &ConfusionMatrix,
    title: &str,
    output_path: &Path,
) -> std::io::Result<()> {
    let n = cm.num_classes;
    let grid = CELL_SIZE * n as f64;
    let width = MARGIN_LEFT + grid + MARGIN_RIGHT;
    let height = MARGIN_TOP + grid + MARGIN_BOTTOM;
    let normalized = cm.normalize_rows();

    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        width, height, width, height
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        width, height
    ));

    // Title
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        width / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));

    // Cells with counts
    for row in 0..n {
        for col in 0..n {
            let x = MARGIN_LEFT + col as f64 * CELL_SIZE;
            let y = MARGIN_TOP + row as f64 * CELL_SIZE;
            let value = normalized[row][col];
            let count = cm.get(row, col);

            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="0.5"/>"#,
                x,
                y,
                CELL_SIZE,
                CELL_SIZE,
                cell_color(value),
                COLOR_GRID
            ));

            if count > 0 {
                let text_color = if value > 0.5 { "white" } else { COLOR_TEXT };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
                    x + CELL_SIZE / 2.0,
                    y + CELL_SIZE / 2.0 + 4.0,
                    text_color,
                    count
                ));
            }
        }
    }

    // Row and column tick labels (the digits)
    for i in 0..n {
        let center = MARGIN_LEFT + i as f64 * CELL_SIZE + CELL_SIZE / 2.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" fill="{}">{}</text>"#,
            center,
            MARGIN_TOP - 10.0,
            COLOR_TEXT,
            i
        ));

        let middle = MARGIN_TOP + i as f64 * CELL_SIZE + CELL_SIZE / 2.0 + 4.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="13" fill="{}">{}</text>"#,
            MARGIN_LEFT - 12.0,
            middle,
            COLOR_TEXT,
            i
        ));
    }

    // Axis titles
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">predicted</text>"#,
        MARGIN_LEFT + grid / 2.0,
        height - 25.0,
        COLOR_TEXT
    ));
    svg.push_str(&format!(
        r#"<text x="30" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 30 {})">actual</text>"#,
        MARGIN_TOP + grid / 2.0,
        COLOR_TEXT,
        MARGIN_TOP + grid / 2.0
    ));

    svg.push_str("</svg>");

    fs::write(output_path, svg)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_color_endpoints() {
        assert_eq!(cell_color(0.0), "#ffffff");
        assert_eq!(cell_color(1.0), "#2980b9");
    }

    #[test]
    fn test_heatmap_written() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 2], &[0, 1, 2, 2], 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cm.svg");

        generate_confusion_heatmap(&cm, "Confusion Matrix", &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("Confusion Matrix"));
        assert!(content.contains("predicted"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
