//! Flow time series plotting
//!
//! [`bus_lines`] turns a node view into step-shaped polylines (each value is
//! held until the next timestep). [`show`] draws them in a native window and
//! needs the `gui` feature.

use crate::results::Results;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub label: String,
    /// (hours since start, flow) pairs
    pub points: Vec<[f64; 2]>,
}

/// One line per flow entering or leaving `bus`; empty when the bus has no
/// flows in the results
pub fn bus_lines(results: &Results, bus: &str) -> Vec<PlotLine> {
    let Some(view) = results.node_view(bus) else {
        return Vec::new();
    };
    let idx = &results.timeindex;
    let dt = idx.timeincrement();

    view.sequences()
        .map(|series| {
            let points = series
                .values
                .iter()
                .enumerate()
                .flat_map(|(t, v)| {
                    let x = idx.hours_since_start(t);
                    [[x, *v], [x + dt, *v]]
                })
                .collect();
            PlotLine {
                label: series.label(),
                points,
            }
        })
        .collect()
}

#[cfg(feature = "gui")]
mod window {
    use anyhow::{anyhow, Result};
    use egui_plot::{Legend, Line, Plot, PlotPoints};

    use super::PlotLine;

    struct FlowPlotApp {
        title: String,
        lines: Vec<PlotLine>,
    }

    impl eframe::App for FlowPlotApp {
        fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(&self.title);
                Plot::new("flow_plot")
                    .legend(Legend::default())
                    .x_axis_label("Time (h)")
                    .y_axis_label("Flow")
                    .show(ui, |plot_ui| {
                        for line in &self.lines {
                            let points: PlotPoints = line.points.clone().into();
                            plot_ui.line(Line::new(points).name(&line.label));
                        }
                    });
            });
        }
    }

    pub fn open(title: String, lines: Vec<PlotLine>) -> Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1000.0, 600.0])
                .with_title(&title),
            ..Default::default()
        };

        eframe::run_native(
            "bus-dispatch",
            options,
            Box::new(move |_cc| Ok(Box::new(FlowPlotApp { title, lines }))),
        )
        .map_err(|e| anyhow!("plot window failed: {}", e))
    }
}

/// Block on a plot window showing every flow at `bus`
#[cfg(feature = "gui")]
pub fn show(results: &Results, bus: &str) -> anyhow::Result<()> {
    let lines = bus_lines(results, bus);
    window::open(format!("Flows at bus '{}'", bus), lines)
}
