//! Structured log output of the tool bar overflow pass.

use std::sync::{Arc, Mutex};

use primkit_core::logging::LAYOUT;
use primkit_layout::{Fixed, LayoutTree, Orientation, Size, ToolBar};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone)]
struct Captured {
    message: String,
    has_overflow: Option<bool>,
}

#[derive(Clone, Default)]
struct LayoutCapture {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S> Layer<S> for LayoutCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != LAYOUT {
            return;
        }
        struct Fields {
            message: String,
            has_overflow: Option<bool>,
        }
        impl tracing::field::Visit for Fields {
            fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
                if field.name() == "has_overflow" {
                    self.has_overflow = Some(value);
                }
            }

            fn record_debug(
                &mut self,
                field: &tracing::field::Field,
                value: &dyn std::fmt::Debug,
            ) {
                if field.name() == "message" {
                    self.message = format!("{value:?}");
                }
            }
        }

        let mut fields = Fields {
            message: String::new(),
            has_overflow: None,
        };
        event.record(&mut fields);
        self.events.lock().expect("capture lock").push(Captured {
            message: fields.message,
            has_overflow: fields.has_overflow,
        });
    }
}

#[test]
fn overflow_moves_are_logged_once_per_item() {
    let capture = LayoutCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut tree = LayoutTree::new();
        let bar = ToolBar::new(&mut tree, Orientation::Horizontal).unwrap();
        for _ in 0..4 {
            let item = tree.insert(Fixed::new(40.0, 10.0));
            bar.add_item(&mut tree, item).unwrap();
        }
        tree.measure(bar.panel(), Size::new(100.0, 20.0)).unwrap();
        tree.invalidate_measure(bar.panel());
        tree.measure(bar.panel(), Size::new(100.0, 20.0)).unwrap();
    });

    let events = capture.events.lock().expect("capture lock");
    let moved = events
        .iter()
        .filter(|e| e.message == "item moved to overflow")
        .count();
    assert_eq!(moved, 2);

    let measured: Vec<_> = events
        .iter()
        .filter(|e| e.message == "tool bar measured")
        .collect();
    assert_eq!(measured.len(), 2);
    assert!(measured.iter().all(|e| e.has_overflow == Some(true)));
}
