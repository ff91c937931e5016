//! SVG drawings of station tours.
//!
//! Points are drawn as small dots, stations as larger red nodes, each
//! non-station point is linked to its nearest station with a dashed line
//! and the cycle is drawn on top.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::solution::Solution;
use std::path::Path;

/// SVG visualization generator
pub struct Visualizer {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Station radius; plain points use half of it
    pub node_radius: f64,
    /// Label every point with its id
    pub labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 6.0,
            labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG visualization of a solution
    pub fn generate_svg(
        &self,
        instance: &Instance,
        matrix: &DistanceMatrix,
        solution: &Solution,
        method: &str,
    ) -> Result<String> {
        let (min_x, max_x, min_y, max_y) = instance
            .bounds()
            .ok_or_else(|| Error::invalid("cannot draw an empty instance"))?;

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };
        let position = |id: usize| -> Result<(f64, f64)> {
            let point = instance.point(id).ok_or(Error::KeyNotFound(id))?;
            Ok(transform(point.x, point.y))
        };

        let mut svg = String::new();
        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .point {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .station {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .link {{ stroke: #95a5a6; stroke-width: 1; stroke-dasharray: 4 3; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 9px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">{} | {} | p={} | cost {:.2} (cycle {:.2}, assignment {:.2})</text>
"#,
            self.margin,
            instance.name,
            method,
            solution.num_stations(),
            solution.cost_total,
            solution.cycle_length,
            solution.assignment_cost
        ));

        for point in &instance.points {
            if solution.stations.contains(&point.id) {
                continue;
            }
            if let Some((station, _)) = matrix.nearest_among(point.id, &solution.stations)? {
                let (x1, y1) = transform(point.x, point.y);
                let (x2, y2) = position(station)?;
                svg.push_str(&format!(
                    r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="link"/>
"#,
                    x1, y1, x2, y2
                ));
            }
        }

        if solution.cycle.len() > 1 {
            let mut path = String::new();
            for (i, &id) in solution.cycle.iter().enumerate() {
                let (x, y) = position(id)?;
                path.push_str(&format!("{}{:.2},{:.2} ", if i == 0 { "M" } else { "L" }, x, y));
            }
            svg.push_str(&format!(
                r#"<path d="{}" class="edge"/>
"#,
                path.trim_end()
            ));
        }

        for point in &instance.points {
            let (x, y) = transform(point.x, point.y);
            let (class, radius) = if solution.stations.contains(&point.id) {
                ("station", self.node_radius)
            } else {
                ("point", self.node_radius / 2.0)
            };
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"#,
                x, y, radius, class
            ));
            if self.labels {
                svg.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"#,
                    x,
                    y - radius - 3.0,
                    point.id
                ));
            }
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }

    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        std::fs::write(path, svg)?;
        Ok(())
    }
}
