//! Sample agents that talk to each other only through the event bus.
//!
//! Two browsers share the current image selection, a viewer opens the
//! selected image and asks for it to be rendered, and a status bar narrates
//! everything it hears.

use agentbus_core::{Event, EventBus, EventType, Subscriber, SubscriberId};
use parking_lot::Mutex;
use std::sync::Arc;

/// An image was selected in a browser
#[derive(Debug, Clone)]
pub struct ImageSelected {
    pub image_id: u64,
    pub source: Option<SubscriberId>,
}

impl Event for ImageSelected {
    fn source(&self) -> Option<SubscriberId> {
        self.source
    }
}

/// The viewer needs pixels for an image
#[derive(Debug, Clone)]
pub struct RenderingRequested {
    pub image_id: u64,
}

impl Event for RenderingRequested {}

/// The viewer window was closed
#[derive(Debug, Clone)]
pub struct ViewerClosed {
    pub image_id: Option<u64>,
}

impl Event for ViewerClosed {}

/// Tree browser that mirrors the selection made in other browsers
#[derive(Debug)]
pub struct Browser {
    name: String,
    selected: Mutex<Option<u64>>,
}

impl Browser {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            selected: Mutex::new(None),
        })
    }

    /// Select an image locally and announce it.
    pub fn select(&self, bus: &EventBus, image_id: u64) -> agentbus_core::Result<()> {
        *self.selected.lock() = Some(image_id);
        bus.post(ImageSelected {
            image_id,
            source: Some(SubscriberId::of_ref(self)),
        })
    }

    pub fn selected(&self) -> Option<u64> {
        *self.selected.lock()
    }
}

impl Subscriber for Browser {
    fn notify(&self, event: &dyn Event, _bus: &EventBus) -> anyhow::Result<()> {
        if let Some(selected) = event.downcast_ref::<ImageSelected>() {
            tracing::info!("{} follows selection of image {}", self.name, selected.image_id);
            *self.selected.lock() = Some(selected.image_id);
        }
        Ok(())
    }
}

/// Image viewer; closing it unsubscribes it from everything
#[derive(Debug, Default)]
pub struct Viewer {
    shown: Mutex<Vec<u64>>,
}

impl Viewer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Close the window and stop listening.
    pub fn close(&self, bus: &EventBus) -> agentbus_core::Result<()> {
        let last = self.shown.lock().last().copied();
        bus.remove_subscriber_id(SubscriberId::of_ref(self));
        bus.post(ViewerClosed { image_id: last })
    }

    pub fn shown(&self) -> Vec<u64> {
        self.shown.lock().clone()
    }
}

impl Subscriber for Viewer {
    fn notify(&self, event: &dyn Event, bus: &EventBus) -> anyhow::Result<()> {
        if let Some(selected) = event.downcast_ref::<ImageSelected>() {
            self.shown.lock().push(selected.image_id);
            bus.post(RenderingRequested {
                image_id: selected.image_id,
            })?;
        }
        Ok(())
    }
}

/// Renders whatever the viewer asks for
#[derive(Debug, Default)]
pub struct Renderer {
    rendered: Mutex<Vec<u64>>,
}

impl Renderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rendered(&self) -> Vec<u64> {
        self.rendered.lock().clone()
    }
}

impl Subscriber for Renderer {
    fn notify(&self, event: &dyn Event, _bus: &EventBus) -> anyhow::Result<()> {
        if let Some(request) = event.downcast_ref::<RenderingRequested>() {
            self.rendered.lock().push(request.image_id);
        }
        Ok(())
    }
}

/// Keeps a line of text for every event it hears
#[derive(Debug, Default)]
pub struct StatusBar {
    lines: Mutex<Vec<String>>,
}

impl StatusBar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Event types the status bar listens to.
    pub fn interests() -> [EventType; 3] {
        [
            EventType::of::<ImageSelected>(),
            EventType::of::<RenderingRequested>(),
            EventType::of::<ViewerClosed>(),
        ]
    }
}

impl Subscriber for StatusBar {
    fn notify(&self, event: &dyn Event, _bus: &EventBus) -> anyhow::Result<()> {
        let line = if let Some(e) = event.downcast_ref::<ImageSelected>() {
            format!("selected image {}", e.image_id)
        } else if let Some(e) = event.downcast_ref::<RenderingRequested>() {
            format!("rendering image {}", e.image_id)
        } else if let Some(e) = event.downcast_ref::<ViewerClosed>() {
            match e.image_id {
                Some(id) => format!("viewer closed on image {}", id),
                None => "viewer closed".to_string(),
            }
        } else {
            format!("unexpected {}", event.event_type())
        };
        self.lines.lock().push(line);
        Ok(())
    }
}

/// What the demo session observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub primary_selection: Option<u64>,
    pub secondary_selection: Option<u64>,
    pub shown: Vec<u64>,
    pub rendered: Vec<u64>,
    pub status: Vec<String>,
}

/// Wire the sample agents to `bus` and play a short browsing session.
///
/// The primary browser selects `1..=images`, the secondary browser selects
/// one more image, then the viewer is closed and a final selection is made.
pub fn run_session(bus: &EventBus, images: u64) -> anyhow::Result<SessionSummary> {
    let primary = Browser::new("primary");
    let secondary = Browser::new("secondary");
    let viewer = Viewer::new();
    let renderer = Renderer::new();
    let status = StatusBar::new();

    let primary_sub: Arc<dyn Subscriber> = primary.clone();
    let secondary_sub: Arc<dyn Subscriber> = secondary.clone();
    let viewer_sub: Arc<dyn Subscriber> = viewer.clone();
    let renderer_sub: Arc<dyn Subscriber> = renderer.clone();
    let status_sub: Arc<dyn Subscriber> = status.clone();

    bus.subscribe::<ImageSelected>(&primary_sub);
    bus.subscribe::<ImageSelected>(&secondary_sub);
    bus.subscribe::<ImageSelected>(&viewer_sub);
    bus.subscribe::<RenderingRequested>(&renderer_sub);
    bus.register_all(&status_sub, &StatusBar::interests())?;

    for image_id in 1..=images {
        primary.select(bus, image_id)?;
    }
    secondary.select(bus, images + 1)?;

    viewer.close(bus)?;
    primary.select(bus, images + 2)?;

    for sub in [
        &primary_sub,
        &secondary_sub,
        &viewer_sub,
        &renderer_sub,
        &status_sub,
    ] {
        bus.remove_subscriber(sub);
    }

    Ok(SessionSummary {
        primary_selection: primary.selected(),
        secondary_selection: secondary.selected(),
        shown: viewer.shown(),
        rendered: renderer.rendered(),
        status: status.lines(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbus_core::EventBusConfig;
    use agentbus_settings::Settings;
    use tempfile::TempDir;

    #[test]
    fn test_browser_ignores_its_own_selection() {
        let bus = EventBus::new();
        let browser = Browser::new("solo");
        let sub: Arc<dyn Subscriber> = browser.clone();
        bus.subscribe::<ImageSelected>(&sub);

        browser.select(&bus, 4).expect("select");
        assert_eq!(browser.selected(), Some(4));
        assert_eq!(bus.stats().suppressed, 1);
        assert_eq!(bus.stats().delivered, 0);
    }

    #[test]
    fn test_viewer_requests_rendering_after_selection_pass() {
        let bus = EventBus::new();
        let viewer = Viewer::new();
        let status = StatusBar::new();
        let viewer_sub: Arc<dyn Subscriber> = viewer.clone();
        let status_sub: Arc<dyn Subscriber> = status.clone();
        bus.subscribe::<ImageSelected>(&viewer_sub);
        bus.register_all(&status_sub, &StatusBar::interests())
            .expect("register");

        bus.post(ImageSelected {
            image_id: 9,
            source: None,
        })
        .expect("post");

        assert_eq!(viewer.shown(), vec![9]);
        assert_eq!(
            status.lines(),
            vec!["selected image 9", "rendering image 9"]
        );
    }

    #[test]
    fn test_browsing_session() {
        let bus = EventBus::new();
        let summary = run_session(&bus, 3).expect("session");

        assert_eq!(summary.primary_selection, Some(5));
        assert_eq!(summary.secondary_selection, Some(5));
        assert_eq!(summary.shown, vec![1, 2, 3, 4]);
        assert_eq!(summary.rendered, vec![1, 2, 3, 4]);
        assert_eq!(
            summary.status,
            vec![
                "selected image 1",
                "rendering image 1",
                "selected image 2",
                "rendering image 2",
                "selected image 3",
                "rendering image 3",
                "selected image 4",
                "rendering image 4",
                "viewer closed on image 4",
                "selected image 5",
            ]
        );

        let stats = bus.stats();
        assert_eq!(stats.posted, 10);
        assert_eq!(stats.suppressed, 5);
        assert!(bus.registered_types().is_empty());
    }

    #[test]
    fn test_session_with_settings_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[bus]\nenable_history = true\nmax_history_size = 4\n",
        )
        .expect("write settings");

        let settings = Settings::load_or_default(&path).expect("settings");
        let bus = EventBus::with_config(settings.bus_config());
        run_session(&bus, 1).expect("session");

        // Only the last four delivery passes are kept.
        let history = bus.history(None);
        assert_eq!(history.len(), 4);
        let types: Vec<_> = history.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "ImageSelected",
                "RenderingRequested",
                "ViewerClosed",
                "ImageSelected"
            ]
        );
        assert!(history[1].reentrant);
    }

    #[test]
    fn test_session_without_self_suppression() {
        let bus = EventBus::with_config(EventBusConfig {
            suppress_self_notification: false,
            ..Default::default()
        });
        let summary = run_session(&bus, 2).expect("session");

        // Browsers now also hear their own selections; the result is unchanged.
        assert_eq!(summary.primary_selection, Some(4));
        assert_eq!(bus.stats().suppressed, 0);
    }
}
