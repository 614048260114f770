use std::sync::Arc;

use model::position::Position;

use crate::markers::MarkerKind;

pub type ClickHandler = Arc<dyn Fn(f64, f64) + Send + Sync>;
pub type SelectionHandler = Arc<dyn Fn(usize) + Send + Sync>;
pub type MarkerHandler = Arc<dyn Fn(&MarkerKind) + Send + Sync>;

/// A raw interaction reported by the map engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Click(Position),
    RouteClick(usize),
    MarkerClick(MarkerKind),
}

/// Hands raw map events to the caller's handlers. Every event is forwarded
/// as is, nothing is debounced or coalesced.
#[derive(Clone, Default)]
pub struct InteractionBridge {
    on_click: Option<ClickHandler>,
    on_route_select: Option<SelectionHandler>,
    on_marker: Option<MarkerHandler>,
}

impl InteractionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(f64, f64) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    pub fn on_route_select(mut self, handler: SelectionHandler) -> Self {
        self.on_route_select = Some(handler);
        self
    }

    pub fn on_marker<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MarkerKind) + Send + Sync + 'static,
    {
        self.on_marker = Some(Arc::new(handler));
        self
    }

    pub fn route_select_handler(&self) -> Option<&SelectionHandler> {
        self.on_route_select.as_ref()
    }

    pub fn dispatch(&self, event: &MapEvent) {
        match event {
            MapEvent::Click(position) => {
                if let Some(handler) = &self.on_click {
                    handler(position.latitude, position.longitude);
                }
            }
            MapEvent::RouteClick(index) => {
                if let Some(handler) = &self.on_route_select {
                    handler(*index);
                }
            }
            MapEvent::MarkerClick(kind) => {
                if let Some(handler) = &self.on_marker {
                    handler(kind);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn forwards_every_event_unchanged() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let selections = Arc::new(Mutex::new(Vec::new()));

        let bridge = {
            let clicks = clicks.clone();
            let selections = selections.clone();
            InteractionBridge::new()
                .on_click(move |lat, lng| clicks.lock().unwrap().push((lat, lng)))
                .on_route_select(Arc::new(move |index| {
                    selections.lock().unwrap().push(index)
                }))
        };

        // identical events in a row are not coalesced
        bridge.dispatch(&MapEvent::Click(Position::new(1.0, 2.0)));
        bridge.dispatch(&MapEvent::Click(Position::new(1.0, 2.0)));
        bridge.dispatch(&MapEvent::RouteClick(2));
        bridge.dispatch(&MapEvent::RouteClick(2));
        bridge.dispatch(&MapEvent::MarkerClick(MarkerKind::Start));

        assert_eq!(*clicks.lock().unwrap(), vec![(1.0, 2.0), (1.0, 2.0)]);
        assert_eq!(*selections.lock().unwrap(), vec![2, 2]);
    }

    #[test]
    fn missing_handlers_are_fine() {
        InteractionBridge::new().dispatch(&MapEvent::RouteClick(0));
    }
}
