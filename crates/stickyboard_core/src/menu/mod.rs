//! Context-menu signal shared between interaction handlers and the UI.
//!
//! # Responsibility
//! - Hold the single currently open context menu, if any.
//! - Notify observers whenever a menu is opened or dismissed.
//!
//! # Invariants
//! - At most one menu is open; opening another replaces it.
//! - Menu actions receive the payload of the menu they were selected from.

use crate::geometry::Point;
use crate::observer::{ObserverId, ObserverList};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Callback run when a menu item is selected.
pub type MenuAction<P> = Arc<dyn Fn(Option<&P>) + Send + Sync>;

/// Callback shape for menu observers.
pub type MenuObserver<P> = dyn FnMut(Option<&ContextMenu<P>>) + Send;

/// One labeled entry of a context menu.
pub struct MenuItem<P> {
    pub label: String,
    /// Display-only keyboard shortcut hint, e.g. `Ctrl+D`.
    pub shortcut: Option<String>,
    pub disabled: bool,
    pub action: Option<MenuAction<P>>,
}

impl<P> MenuItem<P> {
    /// Creates an enabled item without action or shortcut.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            shortcut: None,
            disabled: false,
            action: None,
        }
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn with_action(mut self, action: impl Fn(Option<&P>) + Send + Sync + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Runs the action with `payload` when enabled. Returns whether it ran.
    pub fn invoke(&self, payload: Option<&P>) -> bool {
        match (&self.action, self.disabled) {
            (Some(action), false) => {
                action(payload);
                true
            }
            _ => false,
        }
    }
}

impl<P> Clone for MenuItem<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            shortcut: self.shortcut.clone(),
            disabled: self.disabled,
            action: self.action.clone(),
        }
    }
}

impl<P> Debug for MenuItem<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuItem")
            .field("label", &self.label)
            .field("shortcut", &self.shortcut)
            .field("disabled", &self.disabled)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// A context menu requested at a screen position.
#[derive(Debug, Clone)]
pub struct ContextMenu<P> {
    /// Item groups, rendered with separators between them.
    pub groups: Vec<Vec<MenuItem<P>>>,
    pub position: Point,
    /// Subject of the menu, e.g. the right-clicked notes.
    pub payload: Option<P>,
}

impl<P> ContextMenu<P> {
    pub fn new(groups: Vec<Vec<MenuItem<P>>>, position: Point) -> Self {
        Self {
            groups,
            position,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn item(&self, group: usize, index: usize) -> Option<&MenuItem<P>> {
        self.groups.get(group)?.get(index)
    }
}

/// Nullable "currently open context menu" value with change observers.
pub struct MenuSignal<P> {
    current: Option<ContextMenu<P>>,
    observers: ObserverList<MenuObserver<P>>,
}

impl<P> Default for MenuSignal<P> {
    fn default() -> Self {
        Self {
            current: None,
            observers: ObserverList::new(),
        }
    }
}

impl<P> MenuSignal<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ContextMenu<P>> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Opens `menu`, replacing any menu already open.
    pub fn open(&mut self, menu: ContextMenu<P>) {
        self.set(Some(menu));
    }

    /// Closes the open menu. Dismissing with nothing open notifies nobody.
    pub fn dismiss(&mut self) {
        if self.current.is_some() {
            self.set(None);
        }
    }

    pub fn set(&mut self, menu: Option<ContextMenu<P>>) {
        self.current = menu;
        let current = self.current.as_ref();
        for observer in self.observers.iter_mut() {
            observer(current);
        }
    }

    /// Selects an item of the open menu and dismisses it.
    ///
    /// Returns whether an action ran. Selecting a disabled item or an item
    /// without action dismisses nothing; a missing index is ignored.
    pub fn select(&mut self, group: usize, index: usize) -> bool {
        let Some(menu) = self.current.as_ref() else {
            return false;
        };
        let Some(item) = menu.item(group, index) else {
            return false;
        };
        if !item.invoke(menu.payload.as_ref()) {
            return false;
        }
        self.dismiss();
        true
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(Option<&ContextMenu<P>>) + Send + 'static,
    ) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContextMenu, MenuItem, MenuSignal};
    use crate::geometry::Point;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counting_item(label: &str, counter: &Arc<AtomicUsize>) -> MenuItem<Vec<u32>> {
        let counter = Arc::clone(counter);
        MenuItem::new(label).with_action(move |payload: Option<&Vec<u32>>| {
            counter.fetch_add(payload.map_or(0, Vec::len), Ordering::SeqCst);
        })
    }

    #[test]
    fn last_open_wins_and_dismiss_clears() {
        let mut signal: MenuSignal<u32> = MenuSignal::new();
        signal.open(ContextMenu::new(vec![], Point::new(1.0, 1.0)).with_payload(1));
        signal.open(ContextMenu::new(vec![], Point::new(2.0, 2.0)).with_payload(2));

        let current = signal.current().expect("menu should be open");
        assert_eq!(current.position, Point::new(2.0, 2.0));
        assert_eq!(current.payload, Some(2));

        signal.dismiss();
        assert!(!signal.is_open());
    }

    #[test]
    fn select_runs_action_with_payload_and_dismisses() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut signal = MenuSignal::new();
        signal.open(
            ContextMenu::new(
                vec![
                    vec![counting_item("Duplicate", &counter).with_shortcut("Ctrl+D")],
                    vec![counting_item("Delete", &counter).disabled(true)],
                ],
                Point::new(0.0, 0.0),
            )
            .with_payload(vec![7, 8, 9]),
        );

        assert!(!signal.select(1, 0));
        assert!(!signal.select(4, 0));
        assert!(signal.is_open());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert!(signal.select(0, 0));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!signal.is_open());
    }

    #[test]
    fn observers_see_open_and_dismiss() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut signal: MenuSignal<()> = MenuSignal::new();
        signal.subscribe(move |menu| {
            sink.lock()
                .unwrap()
                .push(menu.map(|menu| menu.position.x));
        });

        signal.open(ContextMenu::new(vec![vec![MenuItem::new("Paste")]], Point::new(5.0, 0.0)));
        signal.dismiss();
        signal.dismiss();

        assert_eq!(*seen.lock().unwrap(), vec![Some(5.0), None]);
    }

    #[test]
    fn item_without_action_does_not_run() {
        let item: MenuItem<()> = MenuItem::new("Nothing");
        assert!(!item.invoke(None));
        assert!(format!("{item:?}").contains("has_action: false"));
    }
}
