use crate::{action::Action, reducer::transition, state::AppState};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared handle on the store: read the current snapshot, dispatch actions, watch for updates.
///
/// Clones refer to the same store.
#[derive(Clone)]
pub struct StoreContext {
    sender: Arc<watch::Sender<Arc<AppState>>>,
}

impl StoreContext {
    pub fn new(initial: AppState) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        StoreContext {
            sender: Arc::new(sender),
        }
    }

    /// Current snapshot.
    pub fn store(&self) -> Arc<AppState> {
        self.sender.borrow().clone()
    }

    /// Applies `action` and publishes the resulting snapshot before returning.
    pub fn dispatch(&self, action: Action) {
        self.sender
            .send_modify(|state| *state = Arc::new(transition(state, &action)));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.sender.subscribe()
    }
}

impl Default for StoreContext {
    fn default() -> Self {
        StoreContext::new(AppState::initial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_publishes_new_snapshot() {
        let context = StoreContext::default();
        let before = context.store();

        context.dispatch(Action::SetDummyText {
            dummy_text: "some dummy text".into(),
        });

        let after = context.store();
        assert_eq!("", before.dummy_text);
        assert_eq!("some dummy text", after.dummy_text);
    }

    #[test]
    fn unrecognized_action_still_publishes_distinct_snapshot() {
        let context = StoreContext::default();
        let before = context.store();

        context.dispatch(Action::Unrecognized);

        let after = context.store();
        assert_eq!(*before, *after);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn subscribers_see_update_synchronously() {
        let context = StoreContext::default();
        let mut first = context.subscribe();
        let second = context.clone().subscribe();

        context.dispatch(Action::SetUser { user: None });
        context.dispatch(Action::SetDummyText {
            dummy_text: "hi".into(),
        });

        assert!(first.has_changed().unwrap());
        assert_eq!("hi", first.borrow_and_update().dummy_text);
        assert_eq!("hi", second.borrow().dummy_text);
    }

    #[tokio::test]
    async fn dispatch_from_other_task_wakes_subscriber() {
        let context = StoreContext::default();
        let mut updates = context.subscribe();

        tokio::spawn({
            let context = context.clone();
            async move {
                context.dispatch(Action::SetDummyText {
                    dummy_text: "from task".into(),
                })
            }
        });

        updates.changed().await.unwrap();
        assert_eq!("from task", updates.borrow().dummy_text);
    }
}
