use iced::{
    mouse, time,
    widget::{
        canvas::{self, fill, Canvas, Fill, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Subscription, Task,
    Theme,
};
use clap::Parser;
use serde::Deserialize;
use skycore::engine::{CelestialFix, VisibleObject};
use skycore::render::{Glyph, PlotKind, PlotLayout, PlotPoint, StatusFields, SurfaceModel, Trace};
use skycore::telemetry::MetricsSnapshot;
use std::time::Duration;

const DEFAULT_FRAME_URL: &str = "http://127.0.0.1:9000/frame";
const FRAME_URL_ENV: &str = "SKYVIEW_FRAME_URL";

#[derive(Parser, Debug)]
#[command(about = "Sky plot viewer for a running skyview tracker")]
struct Args {
    /// Tracker frame endpoint. Falls back to $SKYVIEW_FRAME_URL, then the local default.
    #[arg(long)]
    frame_url: Option<String>,
}

/// Command line wins over the environment; blank values are ignored.
fn frame_url(cli: Option<String>, env: Option<String>) -> String {
    [cli, env]
        .into_iter()
        .flatten()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_FRAME_URL.to_string())
}

fn main() -> iced::Result {
    let args = Args::parse();
    let url = frame_url(args.frame_url, std::env::var(FRAME_URL_ENV).ok());
    iced::application(move || Visualizer::boot(url.clone()), Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Visualizer) -> String {
    match &state.frame {
        Some(frame) if !frame.observer.is_empty() => format!("Skyview - {}", frame.observer),
        _ => "Skyview".into(),
    }
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_millis(500)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    frame_url: String,
    frame: Option<FramePayload>,
    status: String,
    history: Vec<String>,
    connected: bool,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    FrameFetched(Result<FramePayload, String>),
}

impl Visualizer {
    fn boot(frame_url: String) -> (Self, Task<Message>) {
        let first = Task::perform(fetch_frame(frame_url.clone()), Message::FrameFetched);
        (
            Visualizer {
                status: format!("Waiting for tracker at {frame_url}..."),
                frame_url,
                frame: None,
                history: Vec::new(),
                connected: false,
            },
            first,
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_frame(state.frame_url.clone()), Message::FrameFetched),
            Message::FrameFetched(Ok(frame)) => {
                if !state.connected {
                    state.push_history(format!("Connected to tracker at {}", frame.observer));
                    state.connected = true;
                }
                state.status = frame.status.summary();
                state.frame = Some(frame);
                Task::none()
            }
            Message::FrameFetched(Err(err)) => {
                if state.connected {
                    state.push_history(format!("Lost tracker: {err}"));
                    state.connected = false;
                }
                state.status = format!("Tracker unreachable: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let (polar, rectangular) = match &state.frame {
            Some(frame) => (frame.polar.clone(), frame.rectangular.clone()),
            None => (SurfaceModel::default(), SurfaceModel::default()),
        };

        let polar_canvas = Canvas::new(SkyPlot::new(polar, PlotLayout::polar()))
            .width(Length::Fixed(460.0))
            .height(Length::Fixed(460.0));
        let rect_canvas = Canvas::new(SkyPlot::new(rectangular, PlotLayout::rectangular()))
            .width(Length::Fill)
            .height(Length::Fixed(240.0));

        let plots = column![
            text("Sky").size(26),
            polar_canvas,
            text("Azimuth / elevation").size(16),
            rect_canvas,
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let status_column = match &state.frame {
            Some(frame) => status_panel(frame),
            None => Column::new().push(text("No frame yet").size(14)),
        };

        let legend = state
            .frame
            .as_ref()
            .map(|frame| frame.polar.dynamic().to_vec())
            .unwrap_or_default()
            .into_iter()
            .filter(|trace| trace.show_in_legend)
            .fold(Column::new().spacing(4), |col, trace| {
                let [r, g, b] = trace.style.color;
                col.push(
                    text(format!("\u{25cf} {}", trace.name))
                        .size(13)
                        .color(Color::from_rgb8(r, g, b)),
                )
            });

        let highest = state
            .frame
            .as_ref()
            .map(|frame| top_sources(&frame.sources))
            .unwrap_or_default()
            .into_iter()
            .fold(Column::new().spacing(2), |col, line| col.push(text(line).size(12)));

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let side_column = column![
            text("Status").size(26),
            status_column,
            text(&state.status).size(12),
            text("Layers").size(16),
            legend,
            text("Highest objects").size(16),
            Container::new(scrollable(highest).height(Length::Fixed(160.0))).padding(6),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        let layout = row![side_column, plots]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn status_panel(frame: &FramePayload) -> Column<'static, Message> {
    let status = &frame.status;
    let lines = [
        format!("Observer: {}", frame.observer),
        format!("UTC: {}", status.utc),
        format!("Site: {}", status.observer_local),
        format!("Here: {}", status.viewer_local),
        format!("LST: {}", status.sidereal),
        format!(
            "Satellites: {} visible, {} blocked, {} in FOV",
            status.satellites_visible, status.satellites_blocked, status.satellites_in_fov
        ),
        format!(
            "Aircraft: {} visible, {} blocked, {} in FOV",
            status.aircraft_visible, status.aircraft_blocked, status.aircraft_in_fov
        ),
        format!("Sources up: {} of {}", status.sources_up, frame.celestial.len()),
        format!(
            "Ticks {} / refreshes {} / failures {}",
            frame.metrics.ticks, frame.metrics.feed_refreshes, frame.metrics.feed_failures
        ),
    ];
    lines
        .into_iter()
        .fold(Column::new().spacing(4), |col, line| col.push(text(line).size(14)))
}

fn top_sources(sources: &[VisibleObject]) -> Vec<String> {
    let mut sorted: Vec<&VisibleObject> = sources.iter().collect();
    sorted.sort_by(|a, b| b.elevation_deg.total_cmp(&a.elevation_deg));
    sorted
        .into_iter()
        .take(12)
        .map(|source| {
            format!(
                "{} ({}) az {:.1} el {:.1}{}",
                source.name,
                source.category.label(),
                source.azimuth_deg,
                source.elevation_deg,
                if source.in_fov { " FOV" } else { "" }
            )
        })
        .collect()
}

async fn fetch_frame(url: String) -> Result<FramePayload, String> {
    let response = reqwest::get(&url).await.map_err(|e| e.to_string())?;
    response
        .json::<FramePayload>()
        .await
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Deserialize)]
struct FramePayload {
    #[serde(default)]
    observer: String,
    #[serde(default)]
    polar: SurfaceModel,
    #[serde(default)]
    rectangular: SurfaceModel,
    #[serde(default)]
    status: StatusFields,
    #[serde(default)]
    metrics: MetricsSnapshot,
    #[serde(default)]
    sources: Vec<VisibleObject>,
    #[serde(default)]
    celestial: Vec<CelestialFix>,
}

/// Paints one plot surface. Falls back to `default_layout` until the tracker configures it.
#[derive(Clone)]
struct SkyPlot {
    surface: SurfaceModel,
    layout: PlotLayout,
}

impl SkyPlot {
    fn new(surface: SurfaceModel, default_layout: PlotLayout) -> Self {
        let layout = surface.layout.clone().unwrap_or(default_layout);
        Self { surface, layout }
    }

    fn elevation_fraction(&self, elevation_deg: f64) -> f32 {
        let span = (self.layout.elevation_ceiling_deg - self.layout.elevation_floor_deg).max(1.0);
        ((elevation_deg - self.layout.elevation_floor_deg) / span).clamp(0.0, 1.0) as f32
    }

    fn project(&self, bounds: Size, point: &PlotPoint) -> Point {
        match self.layout.kind {
            PlotKind::Polar => {
                let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
                let radius = polar_radius(bounds);
                let r = radius * (1.0 - self.elevation_fraction(point.elevation_deg));
                let theta = point.azimuth_deg.to_radians() as f32;
                Point::new(center.x + r * theta.sin(), center.y - r * theta.cos())
            }
            PlotKind::Rectangular => Point::new(
                (point.azimuth_deg / 360.0) as f32 * bounds.width,
                bounds.height * (1.0 - self.elevation_fraction(point.elevation_deg)),
            ),
        }
    }

    fn draw_grid(&self, frame: &mut Frame, bounds: Size) {
        let grid = Stroke::default()
            .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.25))
            .with_width(1.0);
        match self.layout.kind {
            PlotKind::Polar => {
                let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
                let radius = polar_radius(bounds);
                for elevation in [0.0, 30.0, 60.0] {
                    let r = radius * (1.0 - self.elevation_fraction(elevation));
                    frame.stroke(&Path::circle(center, r), grid);
                }
                let spokes = Path::new(|builder| {
                    for azimuth in (0..360).step_by(45) {
                        builder.move_to(center);
                        let theta = (azimuth as f32).to_radians();
                        builder.line_to(Point::new(
                            center.x + radius * theta.sin(),
                            center.y - radius * theta.cos(),
                        ));
                    }
                });
                frame.stroke(&spokes, grid);
                for (label, azimuth) in [("N", 0.0_f32), ("E", 90.0), ("S", 180.0), ("W", 270.0)] {
                    let theta = azimuth.to_radians();
                    frame.fill_text(canvas::Text {
                        content: label.into(),
                        position: Point::new(
                            center.x + (radius + 8.0) * theta.sin() - 4.0,
                            center.y - (radius + 8.0) * theta.cos() - 7.0,
                        ),
                        color: Color::from_rgb(0.8, 0.8, 0.8),
                        size: 13.0_f32.into(),
                        ..canvas::Text::default()
                    });
                }
            }
            PlotKind::Rectangular => {
                let lines = Path::new(|builder| {
                    for azimuth in (0..=360).step_by(45) {
                        let x = azimuth as f32 / 360.0 * bounds.width;
                        builder.move_to(Point::new(x, 0.0));
                        builder.line_to(Point::new(x, bounds.height));
                    }
                    for elevation in [0.0, 30.0, 60.0] {
                        let y = bounds.height * (1.0 - self.elevation_fraction(elevation));
                        builder.move_to(Point::new(0.0, y));
                        builder.line_to(Point::new(bounds.width, y));
                    }
                });
                frame.stroke(&lines, grid);
            }
        }
    }

    fn draw_trace(&self, frame: &mut Frame, bounds: Size, trace: &Trace) {
        let [r, g, b] = trace.style.color;
        let color = Color::from_rgba8(r, g, b, trace.style.opacity);
        let size = trace.style.size;

        match trace.style.glyph {
            Glyph::Circle => {
                for point in &trace.points {
                    let center = self.project(bounds, point);
                    frame.fill(&Path::circle(center, size / 2.0), color);
                }
            }
            Glyph::Square => {
                for point in &trace.points {
                    let center = self.project(bounds, point);
                    let square = Path::rectangle(
                        Point::new(center.x - size / 2.0, center.y - size / 2.0),
                        Size::new(size, size),
                    );
                    frame.fill(&square, color);
                    frame.stroke(&square, Stroke::default().with_color(Color::BLACK).with_width(1.0));
                }
            }
            Glyph::Outline => {
                for shift in self.seam_shifts() {
                    let outline = self.polygon(bounds, &unwrap_azimuths(&trace.points), shift);
                    frame.fill(&outline, color);
                    frame.stroke(
                        &outline,
                        Stroke::default()
                            .with_color(Color::from_rgba8(r, g, b, 0.5))
                            .with_width(1.0),
                    );
                }
            }
            Glyph::Skyline => self.draw_skyline(frame, bounds, &trace.points, color),
            Glyph::Path => {
                let wraps = self.layout.kind == PlotKind::Rectangular;
                let line = Path::new(|builder| {
                    for segment in path_segments(&trace.points, wraps) {
                        for (i, point) in segment.iter().enumerate() {
                            let projected = self.project(bounds, point);
                            if i == 0 {
                                builder.move_to(projected);
                            } else {
                                builder.line_to(projected);
                            }
                        }
                    }
                });
                frame.stroke(&line, Stroke::default().with_color(color).with_width(size));
            }
        }
    }

    fn draw_skyline(&self, frame: &mut Frame, bounds: Size, points: &[PlotPoint], color: Color) {
        if points.len() < 2 {
            return;
        }
        match self.layout.kind {
            PlotKind::Polar => {
                // Ring between the silhouette and the rim.
                let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
                let radius = polar_radius(bounds);
                let path = Path::new(|builder| {
                    builder.circle(center, radius);
                    for (i, point) in points.iter().enumerate() {
                        let projected = self.project(bounds, point);
                        if i == 0 {
                            builder.move_to(projected);
                        } else {
                            builder.line_to(projected);
                        }
                    }
                    builder.close();
                });
                frame.fill(
                    &path,
                    Fill {
                        rule: fill::Rule::EvenOdd,
                        ..Fill::from(color)
                    },
                );
            }
            PlotKind::Rectangular => {
                let path = Path::new(|builder| {
                    builder.move_to(Point::new(0.0, bounds.height));
                    for point in points {
                        builder.line_to(self.project(bounds, point));
                    }
                    builder.line_to(Point::new(bounds.width, bounds.height));
                    builder.close();
                });
                frame.fill(&path, color);
            }
        }
    }

    /// Outlines crossing north are drawn a second time one turn to the left.
    fn seam_shifts(&self) -> Vec<f64> {
        match self.layout.kind {
            PlotKind::Polar => vec![0.0],
            PlotKind::Rectangular => vec![0.0, -360.0],
        }
    }

    fn polygon(&self, bounds: Size, points: &[PlotPoint], shift_deg: f64) -> Path {
        Path::new(|builder| {
            for (i, point) in points.iter().enumerate() {
                let shifted = PlotPoint::new(point.azimuth_deg + shift_deg, point.elevation_deg);
                let projected = self.project(bounds, &shifted);
                if i == 0 {
                    builder.move_to(projected);
                } else {
                    builder.line_to(projected);
                }
            }
            builder.close();
        })
    }
}

fn polar_radius(bounds: Size) -> f32 {
    bounds.width.min(bounds.height) / 2.0 - 18.0
}

/// Splits a line wherever it jumps across the azimuth seam, which only the
/// rectangular view has.
fn path_segments(points: &[PlotPoint], seam: bool) -> Vec<&[PlotPoint]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..points.len() {
        if seam && (points[i].azimuth_deg - points[i - 1].azimuth_deg).abs() > 180.0 {
            segments.push(&points[start..i]);
            start = i;
        }
    }
    segments.push(&points[start..]);
    segments.retain(|segment| segment.len() > 1);
    segments
}

/// Makes azimuths continuous so a polygon spanning north does not fold back across the plot.
fn unwrap_azimuths(points: &[PlotPoint]) -> Vec<PlotPoint> {
    let mut previous: Option<f64> = None;
    points
        .iter()
        .map(|point| {
            let mut azimuth = point.azimuth_deg;
            if let Some(last) = previous {
                while azimuth - last > 180.0 {
                    azimuth -= 360.0;
                }
                while last - azimuth > 180.0 {
                    azimuth += 360.0;
                }
            }
            previous = Some(azimuth);
            PlotPoint::new(azimuth, point.elevation_deg)
        })
        .collect()
}

impl canvas::Program<Message> for SkyPlot {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        for trace in self.surface.background() {
            self.draw_trace(&mut frame, bounds.size(), trace);
        }
        self.draw_grid(&mut frame, bounds.size());
        for trace in self.surface.dynamic() {
            self.draw_trace(&mut frame, bounds.size(), trace);
        }

        vec![frame.into_geometry()]
    }
}
