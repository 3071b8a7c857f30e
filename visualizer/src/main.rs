use iced::{
    mouse, time,
    widget::{
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, mouse_area, row, scrollable, slider, text, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Subscription, Task,
    Theme,
};
use orbitcore::picking::{Camera, PickReport, PointerPosition, Ray};
use orbitcore::schedule::SchedulerPhase;
use orbitcore::telemetry::MetricsSnapshot;
use orbitcore::{Vector3, Viewport};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";
const GLOBE_RADIUS: f64 = 1.0;
const MARKER_PIXELS: f32 = 2.5;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Orbit Tracker Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_millis(250)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

fn bridge_url(path: &str) -> String {
    let base = std::env::var("TRACKER_BRIDGE").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.into());
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[derive(Debug)]
struct Visualizer {
    view: Option<ViewPayload>,
    threshold: f64,
    threshold_dirty: bool,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    ViewFetched(Result<ViewPayload, String>),
    PointerMoved(Point),
    PointerLeft,
    ThresholdChanged(f64),
    ThresholdReleased,
    Posted(Result<String, String>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                view: None,
                threshold: 0.0,
                threshold_dirty: false,
                status: "Waiting for tracker...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_view(), Message::ViewFetched),
        )
    }

    fn viewport(&self) -> Viewport {
        self.view
            .as_ref()
            .map(|view| view.viewport)
            .unwrap_or_default()
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_view(), Message::ViewFetched),
            Message::ViewFetched(Ok(view)) => {
                if !state.threshold_dirty {
                    state.threshold = view.filter_height_km;
                }
                let previous = state.view.as_ref().map(|v| v.generation);
                if previous != Some(view.generation) {
                    state.push_history(format!(
                        "Refresh #{}: {} of {} objects visible",
                        view.generation, view.visible_count, view.object_count
                    ));
                }
                state.status = format!("{:?}", view.phase);
                state.view = Some(view);
                Task::none()
            }
            Message::ViewFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::PointerMoved(point) => {
                let pointer = PointerPosition::from_screen(
                    f64::from(point.x),
                    f64::from(point.y),
                    &state.viewport(),
                );
                Task::perform(post_pointer(Some(pointer)), Message::Posted)
            }
            Message::PointerLeft => Task::perform(post_pointer(None), Message::Posted),
            Message::ThresholdChanged(value) => {
                state.threshold = value;
                state.threshold_dirty = true;
                Task::none()
            }
            Message::ThresholdReleased => {
                state.threshold_dirty = false;
                Task::perform(post_threshold(state.threshold), Message::Posted)
            }
            Message::Posted(Ok(message)) => {
                if !message.is_empty() {
                    state.push_history(message);
                }
                Task::none()
            }
            Message::Posted(Err(err)) => {
                state.status = format!("Input error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let viewport = state.viewport();

        let visible_info = if let Some(view) = &state.view {
            text(format!(
                "Visible: {} / {} objects",
                view.visible_count, view.object_count
            ))
            .size(18)
        } else {
            text("Visible: n/a").size(18)
        };

        let tooltip = state
            .view
            .as_ref()
            .map(|view| view.tooltip.clone())
            .unwrap_or_default();
        let tooltip_column = if tooltip.is_empty() {
            Column::new().push(text("Hover a marker for details").size(12))
        } else {
            tooltip
                .iter()
                .fold(Column::new().spacing(2), |col, line| col.push(text(line.clone()).size(14)))
        };

        let metrics = state
            .view
            .as_ref()
            .map(|view| view.metrics)
            .unwrap_or_default();

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

        let control_column = column![
            text("Height filter").size(26),
            text(format!("Minimum height: {:.0} km", state.threshold)).size(16),
            slider(0.0..=2000.0, state.threshold, Message::ThresholdChanged)
                .step(10.0)
                .on_release(Message::ThresholdReleased),
            visible_info,
            text(&state.status).size(14),
            text("Selection").size(18),
            Container::new(tooltip_column).padding(6),
            text(format!(
                "Refreshes {} | errors {} | frames {} | picks {}",
                metrics.refresh_cycles, metrics.retrieval_errors, metrics.frames, metrics.picks
            ))
            .size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let globe = Canvas::new(GlobeView::new(state.view.as_ref(), viewport))
            .width(Length::Fixed(viewport.width as f32))
            .height(Length::Fixed(viewport.height as f32));
        let globe = mouse_area(globe)
            .on_move(Message::PointerMoved)
            .on_exit(Message::PointerLeft);

        let layout = row![control_column, globe]
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

async fn fetch_view() -> Result<ViewPayload, String> {
    let response = reqwest::get(bridge_url("/view"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<ViewPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_pointer(pointer: Option<PointerPosition>) -> Result<String, String> {
    let client = reqwest::Client::new();
    let request = match pointer {
        Some(pointer) => client
            .post(bridge_url("/pointer"))
            .json(&json!({"x": pointer.x, "y": pointer.y})),
        None => client.delete(bridge_url("/pointer")),
    };
    let response = request.send().await.map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(String::new())
    } else {
        Err(response.status().to_string())
    }
}

async fn post_threshold(height_km: f64) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(bridge_url("/threshold"))
        .json(&json!({ "height_km": height_km }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(format!("Filter set to {:.0} km", height_km))
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Marker {
    catalog_number: u64,
    position: [f64; 3],
}

#[derive(Debug, Clone, Deserialize)]
struct ViewPayload {
    phase: SchedulerPhase,
    #[serde(default)]
    generation: u64,
    #[serde(default)]
    filter_height_km: f64,
    #[serde(default)]
    visible_count: usize,
    #[serde(default)]
    object_count: usize,
    #[serde(default)]
    markers: Vec<Marker>,
    pick: Option<PickReport>,
    #[serde(default)]
    tooltip: Vec<String>,
    camera: Camera,
    viewport: Viewport,
    #[serde(default)]
    metrics: MetricsSnapshot,
}

/// Screen-space picture of the published view, drawn with the same camera
/// the tracker picks with.
#[derive(Clone)]
struct GlobeView {
    camera: Camera,
    viewport: Viewport,
    markers: Vec<Marker>,
    pick: Option<PickReport>,
}

impl GlobeView {
    fn new(view: Option<&ViewPayload>, viewport: Viewport) -> Self {
        match view {
            Some(view) => Self {
                camera: view.camera.clone(),
                viewport,
                markers: view.markers.clone(),
                pick: view.pick.clone(),
            },
            None => Self {
                camera: Camera::looking_at_origin(3.0, viewport.aspect()),
                viewport,
                markers: Vec::new(),
                pick: None,
            },
        }
    }

    fn to_canvas(&self, point: &Vector3<f64>) -> Option<Point> {
        let (x, y) = self.camera.project(point)?.to_screen(&self.viewport);
        Some(Point::new(x as f32, y as f32))
    }

    /// True when the globe lies between the camera and `point`.
    fn occluded(&self, point: &Vector3<f64>) -> bool {
        let Some(ray) = Ray::new(self.camera.position, point - self.camera.position) else {
            return false;
        };
        let to_point = (point - self.camera.position).norm();
        ray.intersect_sphere(&Vector3::zeros(), GLOBE_RADIUS)
            .map_or(false, |distance| distance < to_point)
    }
}

impl canvas::Program<Message> for GlobeView {
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
            Color::from_rgb(0.02, 0.02, 0.04),
        );

        if let (Some(center), Some(rim)) = (
            self.to_canvas(&Vector3::zeros()),
            self.to_canvas(&Vector3::new(0.0, GLOBE_RADIUS, 0.0)),
        ) {
            let radius = (center.y - rim.y).abs();
            let globe = Path::new(|builder| builder.circle(center, radius));
            frame.fill(&globe, Color::from_rgb(0.05, 0.12, 0.25));
            frame.stroke(
                &globe,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgb(0.25, 0.35, 0.55)),
            );
        }

        let picked = self.pick.as_ref().map(|pick| pick.object.catalog_number);
        for marker in &self.markers {
            let position = Vector3::from(marker.position);
            if self.occluded(&position) {
                continue;
            }
            let Some(point) = self.to_canvas(&position) else {
                continue;
            };
            let (color, size) = if picked == Some(marker.catalog_number) {
                (Color::from_rgb(0.95, 0.55, 0.2), MARKER_PIXELS * 2.0)
            } else {
                (Color::WHITE, MARKER_PIXELS)
            };
            let dot = Path::new(|builder| builder.circle(point, size));
            frame.fill(&dot, color);
        }

        if let Some(pick) = &self.pick {
            let anchor = Point::new(pick.anchor.0 as f32 + 12.0, pick.anchor.1 as f32 + 12.0);
            for (row, line) in pick.tooltip_lines().into_iter().enumerate() {
                frame.fill_text(canvas::Text {
                    content: line,
                    position: Point::new(anchor.x, anchor.y + row as f32 * 16.0),
                    color: Color::WHITE,
                    size: Pixels(14.0),
                    ..canvas::Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }
}
